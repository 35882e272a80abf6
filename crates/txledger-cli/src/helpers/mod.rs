//! Shared helpers for CLI commands.

mod parsing;

pub use parsing::{now_epoch, parse_path, parse_shape, parse_window};
