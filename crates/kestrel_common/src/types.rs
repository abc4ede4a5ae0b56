use std::fmt;

use serde::{Deserialize, Serialize};

/// Log sequence number. Monotonic and unique per writer.
///
/// Signed so that [`UNASSIGNED_LSN`] can mark an entry whose WAL write has
/// not resolved yet.
pub type Lsn = i64;

/// Sentinel for "the WAL write has not assigned an LSN yet".
pub const UNASSIGNED_LSN: Lsn = -1;

/// Identifier of a replica in the replica set.
///
/// `0` is reserved: it never names a real replica and doubles as "no owner"
/// in the limbo and as "the local instance" when passed to `append`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReplicaId(pub u32);

impl ReplicaId {
    pub const NIL: ReplicaId = ReplicaId(0);

    pub fn is_nil(self) -> bool {
        self == Self::NIL
    }
}

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxnId(pub u64);

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
