//! Journal seam for synchro decision records.
//!
//! The limbo never goes through the transaction engine to persist a
//! CONFIRM / ROLLBACK: a decision is one small row, so it is submitted to
//! the journal directly. Submission is asynchronous: the journal invokes a
//! completion callback exactly once when the record is durable (or has
//! failed), and the submitting task blocks on that callback.

pub mod mem;
pub mod record;
pub mod wal;

use kestrel_common::error::JournalError;

/// Completion callback for a submitted decision record.
///
/// Invoked exactly once when `submit` returned `Ok`, possibly before
/// `submit` itself returns. Never invoked when `submit` returned `Err`.
pub type Completion = Box<dyn FnOnce(Result<(), JournalError>) + Send>;

/// Asynchronous single-row journal for decision records.
pub trait Journal: Send + Sync {
    /// Submit one decision record for durable write.
    fn submit(&self, record: DecisionRecord, completion: Completion) -> Result<(), JournalError>;
}

pub use mem::MemJournal;
pub use record::{DecisionKind, DecisionRecord};
pub use wal::{DecisionLog, DecisionLogReader, SyncMode};
