//! Synchronous transaction limbo.
//!
//! The limbo is the in-memory coordinator between "written to the leader's
//! WAL" and "committed": it queues transactions pending a replication
//! quorum, tracks per-replica acknowledged LSNs, emits CONFIRM / ROLLBACK
//! decision records to the journal, and drives blocked producers to
//! completion. Commit always removes from the head of the queue, rollback
//! always from the tail: commit in WAL order, rollback in reverse.

pub mod limbo;
pub mod vclock;


pub use limbo::{Limbo, LimboEntry, LimboStatus};
pub use vclock::VClock;
