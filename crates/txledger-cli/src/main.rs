//! txledger CLI - per-customer transaction ledgers
//!
//! Thin command-line front end over `txledger-core`: it resolves settings,
//! opens the SQLite store and runs one engine operation per customer.

mod app;
mod cli;
mod commands;
mod config;
mod helpers;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use txledger_core::VERSION;

use crate::app::AppContext;
use crate::cli::{Cli, Commands};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = if verbose {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = AppContext::new(&cli);
    match &cli.command {
        Some(Commands::Drop) => commands::handle_drop(&ctx),
        Some(Commands::Clear) => commands::handle_clear(&ctx),
        Some(Commands::Load(args)) => commands::handle_load(&ctx, args),
        Some(Commands::Modify(args)) => commands::handle_modify(&ctx, args),
        Some(Commands::Expire(args)) => commands::handle_expire(&ctx, args),
        Some(Commands::Info(args)) => commands::handle_info(&ctx, args),
        Some(Commands::Completions { shell }) => commands::handle_completions(*shell),
        None => {
            println!("txledger v{}", VERSION);
            println!("\nRun `txledger --help` for usage information.");
            Ok(())
        }
    }
}
