//! Store layer: the record protocol the engine talks to, and its backends.
//!
//! - `traits`: the `Store` trait
//! - `types`: keys, records and primitive ops
//! - `ops`: record-level op execution shared by the backends
//! - `memory`: in-process backend
//! - `sqlite`: SQLite backend

pub mod memory;
pub mod ops;
pub mod sqlite;
pub mod traits;
pub mod types;

pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, DEFAULT_BUSY_TIMEOUT};
pub use traits::Store;
pub use types::{Key, Op, Record};
