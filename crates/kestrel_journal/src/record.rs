use std::fmt;

use serde::{Deserialize, Serialize};

use kestrel_common::types::{Lsn, ReplicaId};

/// Kind of a synchro decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionKind {
    /// Commit every entry at or below the record's LSN.
    Confirm,
    /// Roll back every ack-waiting entry at or above the record's LSN.
    Rollback,
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confirm => write!(f, "CONFIRM"),
            Self::Rollback => write!(f, "ROLLBACK"),
        }
    }
}

/// A single-row decision record.
///
/// Two fields on the wire: the identity of the limbo owner the decision
/// speaks for, and the decision frontier LSN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub kind: DecisionKind,
    pub replica_id: ReplicaId,
    pub lsn: Lsn,
}

impl DecisionRecord {
    pub fn confirm(replica_id: ReplicaId, lsn: Lsn) -> Self {
        Self {
            kind: DecisionKind::Confirm,
            replica_id,
            lsn,
        }
    }

    pub fn rollback(replica_id: ReplicaId, lsn: Lsn) -> Self {
        Self {
            kind: DecisionKind::Rollback,
            replica_id,
            lsn,
        }
    }
}

impl fmt::Display for DecisionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}) from instance {}", self.kind, self.lsn, self.replica_id)
    }
}
