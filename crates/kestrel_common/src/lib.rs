//! Shared types, errors, configuration and scheduling primitives for the
//! kestrel synchronous-replication crates.

pub mod config;
pub mod error;
pub mod task;
pub mod types;

pub use error::{JournalError, KestrelError, LimboError, LimboResult};
pub use types::{Lsn, ReplicaId, TxnId, UNASSIGNED_LSN};
