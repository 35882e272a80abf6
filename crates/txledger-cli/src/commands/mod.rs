//! Command handlers.
//!
//! Every ledger command runs once per customer. A failure that concerns one
//! customer is reported and the next customer is processed; an unavailable
//! store aborts the whole command.

mod entries;
mod maintenance;
mod misc;

pub use entries::{handle_info, handle_load, handle_modify};
pub use maintenance::{handle_clear, handle_drop, handle_expire};
pub use misc::handle_completions;

use tracing::warn;

use crate::app::AppContext;

/// Customers processed by one command run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub succeeded: usize,
    pub failed: usize,
}

/// Run `op` for every customer in the context.
///
/// Recoverable per-customer errors go to stderr. `StoreUnavailable` stops
/// the loop and is returned.
pub fn for_each_customer<F>(ctx: &AppContext, mut op: F) -> anyhow::Result<Outcome>
where
    F: FnMut(&str) -> txledger_core::Result<()>,
{
    let customers = ctx.customers()?;
    let mut outcome = Outcome::default();

    for customer in &customers {
        match op(customer) {
            Ok(()) => outcome.succeeded += 1,
            Err(err) if err.is_transient() => {
                return Err(anyhow::Error::new(err).context(format!(
                    "store unavailable while processing customer {}",
                    customer
                )));
            }
            Err(err) => {
                warn!(customer = customer.as_str(), error = %err, "customer skipped");
                eprintln!("{}: {}", customer, err);
                outcome.failed += 1;
            }
        }
    }

    if outcome.failed > 0 && !ctx.quiet() {
        eprintln!(
            "{} of {} customers failed",
            outcome.failed,
            outcome.succeeded + outcome.failed
        );
    }
    Ok(outcome)
}
