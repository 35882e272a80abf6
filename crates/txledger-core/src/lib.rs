//! # txledger core
//!
//! Per-entity transaction ledgers kept as nested collections inside a
//! record store.
//!
//! Each entity (a customer) owns one record holding a map from transaction
//! id to transaction value, a retention marker used to mint fresh ids, and
//! the shape its values are encoded in.
//!
//! ## Architecture
//!
//! - **value**: dynamic value tree stored in record bins
//! - **codec**: transaction encoding, value shapes, ordering keys
//! - **path**: context paths addressing nested sub-values
//! - **store**: the `Store` protocol with memory and SQLite backends
//! - **ledger**: `LedgerStore`, bulk append and reads
//! - **mutation**: context-addressed numeric updates
//! - **expiration**: retention-window removal with marker entries
//! - **aggregation**: count/sum/average over a ledger

pub mod aggregation;
pub mod codec;
pub mod config;
pub mod error;
pub mod expiration;
pub mod ledger;
pub mod mutation;
pub mod path;
pub mod store;
pub mod value;

pub use aggregation::Aggregate;
pub use codec::{Transaction, ValueShape, MARKER_AMOUNT};
pub use config::LedgerConfig;
pub use error::{LedgerError, Result};
pub use expiration::Expired;
pub use ledger::{LedgerStore, RetentionMetadata};
pub use path::{ContextPath, Selection, Step};
pub use store::{MemoryStore, SqliteStore, Store};
pub use value::{MapKey, Value};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
