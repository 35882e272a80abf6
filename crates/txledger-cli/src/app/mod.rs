//! Application-level wiring for the CLI.

mod context;

pub use context::AppContext;
