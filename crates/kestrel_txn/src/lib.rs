//! Transaction objects as the synchronous-replication layer sees them.
//!
//! A [`Txn`] carries exactly the surface the limbo consumes: wait flags, a
//! signature integer describing the WAL outcome, one-shot commit/rollback
//! trigger lists, and the owning task handle the async WAL path wakes.

use std::sync::atomic::{AtomicI64, AtomicU64, AtomicU8, Ordering};

use parking_lot::Mutex;

use kestrel_common::task::TaskHandle;
use kestrel_common::types::TxnId;

/// Transaction flag bits.
pub mod flags {
    /// Completion must wait for every preceding synchronous transaction.
    pub const WAIT_SYNC: u8 = 1 << 0;
    /// Must collect a replication quorum of acknowledgements of its own.
    pub const WAIT_ACK: u8 = 1 << 1;
    /// Completion has run; the transaction is finished.
    pub const IS_DONE: u8 = 1 << 2;
}

/// The WAL write has not resolved yet.
pub const SIGNATURE_PENDING: i64 = -1;
/// Rolled back because the quorum wait timed out.
pub const SIGNATURE_QUORUM_TIMEOUT: i64 = -2;
/// Rolled back by a ROLLBACK decision record.
pub const SIGNATURE_SYNC_ROLLBACK: i64 = -3;

/// Identifier of an installed trigger; used to detach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerId(u64);

type TriggerFn = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct TriggerList {
    items: Vec<(TriggerId, TriggerFn)>,
}

impl TriggerList {
    fn add(&mut self, id: TriggerId, f: TriggerFn) {
        self.items.push((id, f));
    }

    fn remove(&mut self, id: TriggerId) -> bool {
        match self.items.iter().position(|(tid, _)| *tid == id) {
            Some(pos) => {
                self.items.remove(pos);
                true
            }
            None => false,
        }
    }

    fn drain(&mut self) -> Vec<TriggerFn> {
        std::mem::take(&mut self.items)
            .into_iter()
            .map(|(_, f)| f)
            .collect()
    }
}

/// A transaction pending in (or finished by) the synchronous-replication
/// pipeline.
///
/// Flags and signature are atomics: the limbo mutates them under its own
/// lock, while producers and the async WAL path may read them from any
/// thread. Triggers are one-shot; firing removes them. Triggers must not
/// re-enter the limbo: they run in the middle of a queue walk.
pub struct Txn {
    id: TxnId,
    flags: AtomicU8,
    signature: AtomicI64,
    owner: Mutex<Option<TaskHandle>>,
    on_commit: Mutex<TriggerList>,
    on_rollback: Mutex<TriggerList>,
    next_trigger_id: AtomicU64,
}

impl Txn {
    pub fn new(id: TxnId) -> Self {
        Self {
            id,
            flags: AtomicU8::new(0),
            signature: AtomicI64::new(SIGNATURE_PENDING),
            owner: Mutex::new(None),
            on_commit: Mutex::new(TriggerList::default()),
            on_rollback: Mutex::new(TriggerList::default()),
            next_trigger_id: AtomicU64::new(1),
        }
    }

    pub fn id(&self) -> TxnId {
        self.id
    }

    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags.load(Ordering::Acquire) & flag != 0
    }

    pub fn set_flag(&self, flag: u8) {
        self.flags.fetch_or(flag, Ordering::AcqRel);
    }

    pub fn clear_flag(&self, flag: u8) {
        self.flags.fetch_and(!flag, Ordering::AcqRel);
    }

    pub fn is_done(&self) -> bool {
        self.has_flag(flags::IS_DONE)
    }

    /// WAL outcome: negative while the write is pending (or after a
    /// rollback sentinel was installed), the assigned LSN otherwise.
    pub fn signature(&self) -> i64 {
        self.signature.load(Ordering::Acquire)
    }

    pub fn set_signature(&self, signature: i64) {
        self.signature.store(signature, Ordering::Release);
    }

    /// The task the async WAL path wakes when it finishes the transaction.
    pub fn owner(&self) -> Option<TaskHandle> {
        self.owner.lock().clone()
    }

    pub fn set_owner(&self, owner: Option<TaskHandle>) {
        *self.owner.lock() = owner;
    }

    /// Replace the owner handle, returning the previous one.
    pub fn swap_owner(&self, owner: Option<TaskHandle>) -> Option<TaskHandle> {
        std::mem::replace(&mut *self.owner.lock(), owner)
    }

    /// Install a one-shot trigger that runs when the transaction commits.
    pub fn on_commit(&self, f: impl FnOnce() + Send + 'static) -> TriggerId {
        let id = self.alloc_trigger_id();
        self.on_commit.lock().add(id, Box::new(f));
        id
    }

    /// Install a one-shot trigger that runs when the transaction rolls back.
    pub fn on_rollback(&self, f: impl FnOnce() + Send + 'static) -> TriggerId {
        let id = self.alloc_trigger_id();
        self.on_rollback.lock().add(id, Box::new(f));
        id
    }

    /// Detach a trigger. A no-op when it already fired or was detached.
    pub fn drop_trigger(&self, id: TriggerId) {
        if !self.on_commit.lock().remove(id) {
            self.on_rollback.lock().remove(id);
        }
    }

    /// Finish the transaction: mark it done, run the commit triggers when
    /// the signature is non-negative (the rollback triggers otherwise) and
    /// wake the owning task.
    pub fn complete(&self) {
        debug_assert!(!self.is_done());
        let committed = self.signature() >= 0;
        self.set_flag(flags::IS_DONE);
        let fired = if committed {
            self.on_commit.lock().drain()
        } else {
            self.on_rollback.lock().drain()
        };
        for f in fired {
            f();
        }
        tracing::debug!(txn = %self.id, committed, "transaction completed");
        if let Some(owner) = self.owner() {
            owner.wake();
        }
    }

    fn alloc_trigger_id(&self) -> TriggerId {
        TriggerId(self.next_trigger_id.fetch_add(1, Ordering::Relaxed))
    }
}
