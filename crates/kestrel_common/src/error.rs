use thiserror::Error;

use crate::types::ReplicaId;

/// Convenience alias for `Result<T, LimboError>`.
pub type LimboResult<T> = Result<T, LimboError>;

/// Top-level error type that layer-specific errors convert into.
#[derive(Error, Debug)]
pub enum KestrelError {
    #[error("Limbo error: {0}")]
    Limbo(#[from] LimboError),

    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors surfaced by the synchronous transaction limbo.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimboError {
    /// `append` was called with a different owner while the queue still
    /// holds entries from the current one.
    #[error("cannot commit: the limbo holds uncommitted synchronous transactions owned by instance {owner}")]
    ForeignSyncTxns { owner: ReplicaId },

    /// The journal rejected a CONFIRM / ROLLBACK decision record.
    #[error("failed to write a synchro decision record to the WAL")]
    WalIo,

    /// The producer's wait exceeded the synchro timeout before the entry
    /// was committed.
    #[error("quorum was not reached within the synchro timeout")]
    SyncQuorumTimeout,

    /// The producer's entry was rolled back by a ROLLBACK decision.
    #[error("transaction was rolled back by a synchro ROLLBACK")]
    SyncRollback,

    /// Allocating a limbo entry failed.
    #[error("out of memory allocating a limbo entry")]
    OutOfMemory,
}

impl LimboError {
    /// True for outcomes the client may retry after back-off.
    pub fn is_transient(self) -> bool {
        matches!(self, LimboError::SyncQuorumTimeout | LimboError::WalIo)
    }
}

/// Journal layer errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JournalError {
    #[error("journal I/O error: {0}")]
    Io(String),

    #[error("journal rejected the entry: {0}")]
    Rejected(String),

    #[error("decision record corrupted: {0}")]
    Corrupted(String),
}

impl From<std::io::Error> for JournalError {
    fn from(e: std::io::Error) -> Self {
        JournalError::Io(e.to_string())
    }
}
