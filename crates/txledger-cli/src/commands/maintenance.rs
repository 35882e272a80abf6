use crate::app::AppContext;
use crate::cli::ExpireArgs;
use crate::commands::for_each_customer;
use crate::helpers::{now_epoch, parse_path, parse_window};

pub fn handle_drop(ctx: &AppContext) -> anyhow::Result<()> {
    let ledger = ctx.open_ledger()?;
    for_each_customer(ctx, |customer| {
        ledger.drop_entity(customer)?;
        if !ctx.quiet() {
            println!("Dropped {}", customer);
        }
        Ok(())
    })
    .map(|_| ())
}

pub fn handle_clear(ctx: &AppContext) -> anyhow::Result<()> {
    let ledger = ctx.open_ledger()?;
    for_each_customer(ctx, |customer| {
        ledger.clear(customer)?;
        if !ctx.quiet() {
            println!("Cleared {}", customer);
        }
        Ok(())
    })
    .map(|_| ())
}

pub fn handle_expire(ctx: &AppContext, args: &ExpireArgs) -> anyhow::Result<()> {
    let window = parse_window(&args.window)?;
    let key_path = args.key_path.as_deref().map(parse_path).transpose()?;
    let now = args.now.unwrap_or_else(now_epoch);
    let ledger = ctx.open_ledger()?;

    for_each_customer(ctx, |customer| {
        let expired = ledger.expire(customer, window, now, key_path.as_ref())?;
        if !ctx.quiet() {
            println!(
                "Expired {} transactions of {} before {} (marker {})",
                expired.removed, customer, expired.cutoff, expired.marker_id
            );
        }
        Ok(())
    })
    .map(|_| ())
}
