//! In-memory journal for tests and embedders.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use kestrel_common::error::JournalError;

use crate::record::DecisionRecord;
use crate::{Completion, Journal};

/// Journal that keeps every accepted record in memory.
///
/// Two switches model the interesting journal behaviors:
/// - `set_fail(true)` makes `submit` reject, exercising WAL-failure paths;
/// - `set_hold(true)` parks completions until [`MemJournal::release_held`],
///   modeling a write that is still in flight.
#[derive(Default)]
pub struct MemJournal {
    records: Mutex<Vec<DecisionRecord>>,
    held: Mutex<Vec<(DecisionRecord, Completion)>>,
    fail: AtomicBool,
    hold: AtomicBool,
}

impl MemJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record accepted so far, in submission order.
    pub fn records(&self) -> Vec<DecisionRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Make every subsequent `submit` fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Park completions of subsequent submissions until `release_held`.
    pub fn set_hold(&self, hold: bool) {
        self.hold.store(hold, Ordering::SeqCst);
    }

    /// Number of submissions whose completion is still parked.
    pub fn held_len(&self) -> usize {
        self.held.lock().len()
    }

    /// Record and complete every held submission, in submission order.
    pub fn release_held(&self) {
        let held = std::mem::take(&mut *self.held.lock());
        for (record, completion) in held {
            self.records.lock().push(record);
            completion(Ok(()));
        }
    }
}

impl Journal for MemJournal {
    fn submit(&self, record: DecisionRecord, completion: Completion) -> Result<(), JournalError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(JournalError::Rejected("journal failure injected".into()));
        }
        if self.hold.load(Ordering::SeqCst) {
            self.held.lock().push((record, completion));
            return Ok(());
        }
        self.records.lock().push(record);
        completion(Ok(()));
        Ok(())
    }
}
