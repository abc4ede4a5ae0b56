//! Per-replica acknowledged-LSN vector.

use std::collections::BTreeMap;

use kestrel_common::types::{Lsn, ReplicaId};

/// Maps each known replica to the highest LSN it has durably acknowledged.
///
/// The limbo owns one of these, mirroring durable positions as reported by
/// the applier. Positions only move forward.
#[derive(Debug, Clone, Default)]
pub struct VClock {
    positions: BTreeMap<ReplicaId, Lsn>,
}

impl VClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position of `id`; 0 when the replica has never acknowledged anything.
    pub fn get(&self, id: ReplicaId) -> Lsn {
        self.positions.get(&id).copied().unwrap_or(0)
    }

    /// Advance `id` to `lsn`. The caller guarantees `lsn` is ahead of the
    /// current position.
    pub fn follow(&mut self, id: ReplicaId, lsn: Lsn) {
        debug_assert!(lsn > self.get(id));
        self.positions.insert(id, lsn);
    }

    /// Number of replicas whose position is at or past `lsn`.
    pub fn count_at_or_above(&self, lsn: Lsn) -> usize {
        self.positions.values().filter(|&&pos| pos >= lsn).count()
    }

    /// Number of tracked replicas.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ReplicaId, Lsn)> + '_ {
        self.positions.iter().map(|(&id, &lsn)| (id, lsn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_replica_is_zero() {
        let vclock = VClock::new();
        assert_eq!(vclock.get(ReplicaId(3)), 0);
        assert!(vclock.is_empty());
    }

    #[test]
    fn test_follow_advances() {
        let mut vclock = VClock::new();
        vclock.follow(ReplicaId(1), 5);
        vclock.follow(ReplicaId(2), 8);
        vclock.follow(ReplicaId(1), 10);
        assert_eq!(vclock.get(ReplicaId(1)), 10);
        assert_eq!(vclock.get(ReplicaId(2)), 8);
        assert_eq!(vclock.len(), 2);
    }

    #[test]
    fn test_count_at_or_above() {
        let mut vclock = VClock::new();
        vclock.follow(ReplicaId(1), 5);
        vclock.follow(ReplicaId(2), 8);
        vclock.follow(ReplicaId(3), 12);
        assert_eq!(vclock.count_at_or_above(5), 3);
        assert_eq!(vclock.count_at_or_above(8), 2);
        assert_eq!(vclock.count_at_or_above(9), 1);
        assert_eq!(vclock.count_at_or_above(13), 0);
    }

    #[test]
    fn test_iter_in_replica_order() {
        let mut vclock = VClock::new();
        vclock.follow(ReplicaId(2), 8);
        vclock.follow(ReplicaId(1), 5);
        let positions: Vec<_> = vclock.iter().collect();
        assert_eq!(positions, vec![(ReplicaId(1), 5), (ReplicaId(2), 8)]);
    }
}
