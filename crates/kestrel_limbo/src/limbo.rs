//! The limbo proper: entry queue, acknowledgement tracking, decision
//! writing/application and producer coordination.
//!
//! Every method runs under one exclusive lock over the queue + vclock +
//! owner state. The blocking protocols release it at exactly three points:
//! while a decision record is in flight at the journal, inside the timed
//! condition wait of `wait_complete` / `wait_confirm`, and inside the
//! untimed "another producer is already rolling us back" wait. Decision
//! writers additionally serialize on a gate so that at most one decision is
//! in flight and CONFIRM emission never regresses.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Instant;

use parking_lot::Mutex as PlainMutex;

use kestrel_common::config::SynchroParams;
use kestrel_common::error::{LimboError, LimboResult};
use kestrel_common::task::TaskHandle;
use kestrel_common::types::{Lsn, ReplicaId, UNASSIGNED_LSN};
use kestrel_journal::{Completion, DecisionKind, DecisionRecord, Journal};
use kestrel_txn::{flags, Txn, SIGNATURE_QUORUM_TIMEOUT, SIGNATURE_SYNC_ROLLBACK};

use crate::vclock::VClock;

/// One pending synchronous transaction.
///
/// Producers hold a borrowed `Arc` to their entry; the queue owns the entry
/// until a commit or rollback marks it terminal and removes it. The mutable
/// fields are atomics so terminal state can be read without the limbo lock,
/// but every mutation happens under it.
pub struct LimboEntry {
    txn: Arc<Txn>,
    /// Assigned once, when the transaction's WAL write resolves.
    lsn: AtomicI64,
    /// Distinct replicas (the leader included) whose acked position covers
    /// `lsn`. Non-decreasing while the entry lives.
    ack_count: AtomicUsize,
    is_commit: AtomicBool,
    is_rollback: AtomicBool,
}

impl std::fmt::Debug for LimboEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LimboEntry")
            .field("txn_id", &self.txn.id())
            .field("lsn", &self.lsn.load(Ordering::Relaxed))
            .field("ack_count", &self.ack_count.load(Ordering::Relaxed))
            .field("is_commit", &self.is_commit.load(Ordering::Relaxed))
            .field("is_rollback", &self.is_rollback.load(Ordering::Relaxed))
            .finish()
    }
}

impl LimboEntry {
    fn new(txn: Arc<Txn>) -> Self {
        Self {
            txn,
            lsn: AtomicI64::new(UNASSIGNED_LSN),
            ack_count: AtomicUsize::new(0),
            is_commit: AtomicBool::new(false),
            is_rollback: AtomicBool::new(false),
        }
    }

    pub fn txn(&self) -> &Arc<Txn> {
        &self.txn
    }

    pub fn lsn(&self) -> Lsn {
        self.lsn.load(Ordering::Acquire)
    }

    pub fn ack_count(&self) -> usize {
        self.ack_count.load(Ordering::Acquire)
    }

    pub fn is_commit(&self) -> bool {
        self.is_commit.load(Ordering::Acquire)
    }

    pub fn is_rollback(&self) -> bool {
        self.is_rollback.load(Ordering::Acquire)
    }

    /// Terminal: one of commit / rollback has been decided.
    pub fn is_complete(&self) -> bool {
        self.is_commit() || self.is_rollback()
    }

    fn set_lsn(&self, lsn: Lsn) {
        self.lsn.store(lsn, Ordering::Release);
    }

    fn set_ack_count(&self, count: usize) {
        self.ack_count.store(count, Ordering::Release);
    }

    fn bump_acks(&self) -> usize {
        self.ack_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn mark_commit(&self) {
        debug_assert!(!self.is_rollback());
        self.is_commit.store(true, Ordering::Release);
    }

    fn mark_rollback(&self) {
        debug_assert!(!self.is_commit());
        self.is_rollback.store(true, Ordering::Release);
    }
}

struct LimboInner {
    /// Entries in WAL-write order; tail is the most recent.
    queue: VecDeque<Arc<LimboEntry>>,
    /// Identity of the current synchronous-write owner. NIL when there has
    /// never been one. Changes only across an empty-queue boundary.
    owner_id: ReplicaId,
    /// Highest durably acknowledged LSN per replica.
    vclock: VClock,
    /// Greatest LSN a CONFIRM has been applied for.
    confirmed_lsn: Lsn,
    /// Entries popped due to rollback, ever.
    rollback_count: u64,
}

/// Point-in-time snapshot of the limbo for observability.
#[derive(Debug, Clone)]
pub struct LimboStatus {
    pub owner_id: ReplicaId,
    pub queue_len: usize,
    pub confirmed_lsn: Lsn,
    pub rollback_count: u64,
    /// Per-replica acked LSNs, in replica-id order.
    pub acked: Vec<(ReplicaId, Lsn)>,
}

/// Result slot for a decision write in flight at the journal.
struct WriteWait {
    done: AtomicBool,
    result: PlainMutex<Option<Result<(), kestrel_common::error::JournalError>>>,
    task: TaskHandle,
}

/// The synchronous transaction limbo. One per process.
pub struct Limbo {
    inner: Mutex<LimboInner>,
    /// Producers block here; every terminal transition broadcasts it.
    wait_cond: Condvar,
    /// Serializes decision writers. Never acquired while `inner` is held.
    decision_gate: PlainMutex<()>,
    journal: Arc<dyn Journal>,
    params: Arc<SynchroParams>,
    /// Identity of this instance, for owner adoption and local-LSN recount.
    instance_id: ReplicaId,
}

impl Limbo {
    pub fn new(
        instance_id: ReplicaId,
        journal: Arc<dyn Journal>,
        params: Arc<SynchroParams>,
    ) -> Self {
        debug_assert!(!instance_id.is_nil());
        Self {
            inner: Mutex::new(LimboInner {
                queue: VecDeque::new(),
                owner_id: ReplicaId::NIL,
                vclock: VClock::new(),
                confirmed_lsn: 0,
                rollback_count: 0,
            }),
            wait_cond: Condvar::new(),
            decision_gate: PlainMutex::new(()),
            journal,
            params,
            instance_id,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LimboInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn owner_id(&self) -> ReplicaId {
        self.lock().owner_id
    }

    pub fn rollback_count(&self) -> u64 {
        self.lock().rollback_count
    }

    pub fn status(&self) -> LimboStatus {
        let inner = self.lock();
        LimboStatus {
            owner_id: inner.owner_id,
            queue_len: inner.queue.len(),
            confirmed_lsn: inner.confirmed_lsn,
            rollback_count: inner.rollback_count,
            acked: inner.vclock.iter().collect(),
        }
    }

    // ── Queue and entry management ─────────────────────────────────────

    /// Queue a synchronous transaction owned by instance `id` (NIL means
    /// the local instance). Fails when the queue still holds entries from
    /// a different owner.
    pub fn append(&self, id: ReplicaId, txn: Arc<Txn>) -> LimboResult<Arc<LimboEntry>> {
        debug_assert!(txn.has_flag(flags::WAIT_SYNC));
        let id = if id.is_nil() { self.instance_id } else { id };
        let mut inner = self.lock();
        if inner.owner_id != id {
            if inner.owner_id.is_nil() || inner.queue.is_empty() {
                inner.owner_id = id;
            } else {
                return Err(LimboError::ForeignSyncTxns {
                    owner: inner.owner_id,
                });
            }
        }
        let entry = Arc::new(LimboEntry::new(txn));
        inner.queue.push_back(Arc::clone(&entry));
        Ok(entry)
    }

    /// Record the LSN the WAL write assigned to the entry's transaction.
    ///
    /// When this instance is the owner, the ack count is recomputed from
    /// the vclock: replicas may have acknowledged the LSN before it was
    /// known locally.
    pub fn assign_lsn(&self, entry: &LimboEntry, lsn: Lsn) {
        let inner = self.lock();
        debug_assert!(!inner.owner_id.is_nil());
        debug_assert_eq!(entry.lsn(), UNASSIGNED_LSN);
        debug_assert!(lsn > 0);
        debug_assert!(entry.txn.has_flag(flags::WAIT_ACK));
        entry.set_lsn(lsn);
        if inner.owner_id == self.instance_id {
            let acks = inner.vclock.count_at_or_above(lsn);
            debug_assert!(acks >= entry.ack_count());
            entry.set_ack_count(acks);
        }
    }

    /// Pop and roll back the tail entry. Commit removes from the head,
    /// rollback from the tail; a rolled back entry is always the last one.
    fn abort_locked(inner: &mut LimboInner) -> Arc<LimboEntry> {
        let entry = inner.queue.pop_back().expect("abort on an empty limbo");
        entry.mark_rollback();
        inner.rollback_count += 1;
        entry
    }

    /// Roll back the tail entry (precondition: `entry` is the tail).
    pub fn abort(&self, entry: &Arc<LimboEntry>) {
        {
            let mut inner = self.lock();
            let tail = Self::abort_locked(&mut inner);
            debug_assert!(Arc::ptr_eq(&tail, entry));
        }
        self.wait_cond.notify_all();
    }

    // ── Acknowledgement tracking ───────────────────────────────────────

    /// Record that `replica_id` has durably reached `lsn`, credit every
    /// newly covered entry, and confirm up to the quorum frontier.
    pub fn ack(&self, replica_id: ReplicaId, lsn: Lsn) {
        let mut inner = self.lock();
        if inner.queue.is_empty() {
            return;
        }
        debug_assert!(!inner.owner_id.is_nil());
        let prev_lsn = inner.vclock.get(replica_id);
        if lsn <= prev_lsn {
            return;
        }
        inner.vclock.follow(replica_id, lsn);

        let quorum = self.params.quorum();
        let mut confirm_lsn = UNASSIGNED_LSN;
        for entry in inner.queue.iter() {
            debug_assert!(entry.ack_count() <= inner.vclock.len());
            if entry.lsn() > lsn {
                break;
            }
            if !entry.txn.has_flag(flags::WAIT_ACK) {
                // An async entry commits only on the back of a sync entry
                // that crossed quorum earlier in this pass.
                debug_assert_eq!(entry.lsn(), UNASSIGNED_LSN);
                if confirm_lsn == UNASSIGNED_LSN {
                    continue;
                }
            } else if entry.lsn() <= prev_lsn {
                // This replica was already counted for this entry.
                continue;
            } else if entry.bump_acks() < quorum {
                continue;
            } else {
                confirm_lsn = entry.lsn();
            }
        }
        drop(inner);

        if confirm_lsn == UNASSIGNED_LSN {
            return;
        }
        if let Err(err) = self.confirm(confirm_lsn) {
            // Keep the queue as is; a later ack or a parameter change
            // retries the CONFIRM.
            tracing::error!(lsn = confirm_lsn, error = %err, "failed to write CONFIRM, keeping entries pending");
        }
    }

    // ── Decision records ───────────────────────────────────────────────

    /// Write a CONFIRM for `lsn` and apply it locally.
    ///
    /// The frontier is re-validated under the gate: while this writer
    /// waited, a racing rollback may have removed the covered entries and
    /// a racing confirm may have committed them. Clamping to the highest
    /// covered entry still in the queue keeps the log free of CONFIRMs
    /// for LSNs that were already rolled back.
    fn confirm(&self, lsn: Lsn) -> LimboResult<()> {
        let _gate = self.decision_gate.lock();
        let lsn = {
            let inner = self.lock();
            let mut live = UNASSIGNED_LSN;
            for entry in inner.queue.iter() {
                if !entry.txn.has_flag(flags::WAIT_ACK) || entry.lsn() == UNASSIGNED_LSN {
                    continue;
                }
                if entry.lsn() > lsn {
                    break;
                }
                live = entry.lsn();
            }
            if live == UNASSIGNED_LSN || live <= inner.confirmed_lsn {
                // Nothing left to confirm at this frontier.
                return Ok(());
            }
            live
        };
        self.write_decision(DecisionKind::Confirm, lsn)?;
        self.read_confirm(lsn);
        Ok(())
    }

    /// Write a ROLLBACK for `lsn` and apply it locally.
    fn rollback(&self, lsn: Lsn) -> LimboResult<()> {
        let _gate = self.decision_gate.lock();
        self.write_decision(DecisionKind::Rollback, lsn)?;
        self.read_rollback(lsn);
        Ok(())
    }

    /// Submit a single-row decision record and block until the journal's
    /// completion callback resolves it.
    fn write_decision(&self, kind: DecisionKind, lsn: Lsn) -> LimboResult<()> {
        let owner = self.lock().owner_id;
        debug_assert!(!owner.is_nil());
        debug_assert!(lsn > 0);
        let record = match kind {
            DecisionKind::Confirm => DecisionRecord::confirm(owner, lsn),
            DecisionKind::Rollback => DecisionRecord::rollback(owner, lsn),
        };

        let wait = Arc::new(WriteWait {
            done: AtomicBool::new(false),
            result: PlainMutex::new(None),
            task: TaskHandle::current(),
        });
        let slot = Arc::clone(&wait);
        let completion: Completion = Box::new(move |res| {
            *slot.result.lock() = Some(res);
            slot.done.store(true, Ordering::Release);
            slot.task.wake();
        });

        if let Err(err) = self.journal.submit(record, completion) {
            tracing::error!(record = %record, error = %err, "journal rejected decision record");
            return Err(LimboError::WalIo);
        }
        while !wait.done.load(Ordering::Acquire) {
            std::thread::park();
        }
        let outcome = wait.result.lock().take();
        match outcome {
            Some(Ok(())) => {
                tracing::debug!(record = %record, "decision record durable");
                Ok(())
            }
            res => {
                if let Some(Err(err)) = res {
                    tracing::error!(record = %record, error = %err, "decision record write failed");
                }
                Err(LimboError::WalIo)
            }
        }
    }

    // ── Decision application ───────────────────────────────────────────

    /// Apply a CONFIRM at `lsn`: commit and remove entries from the head
    /// until the first ack-waiting entry past the frontier (or one whose
    /// local WAL write has not resolved yet).
    pub fn read_confirm(&self, lsn: Lsn) {
        let mut inner = self.lock();
        debug_assert!(!inner.owner_id.is_nil());
        let mut committed_lsn = UNASSIGNED_LSN;
        while let Some(front) = inner.queue.front() {
            let entry = Arc::clone(front);
            if entry.txn.has_flag(flags::WAIT_ACK) {
                if entry.lsn() > lsn {
                    break;
                }
                // Nothing may commit past a local WAL write still in
                // progress.
                if entry.lsn() == UNASSIGNED_LSN {
                    break;
                }
                committed_lsn = entry.lsn();
            }
            inner.queue.pop_front();
            entry.mark_commit();
            entry.txn.clear_flag(flags::WAIT_SYNC);
            entry.txn.clear_flag(flags::WAIT_ACK);
            // When the WAL side finished first the signature is already
            // non-negative and the transaction can be finished here.
            // Otherwise the async WAL callback observes the cleared flags
            // and finishes it.
            if entry.txn.signature() >= 0 {
                entry.txn.complete();
            }
        }
        // The watermark follows what was actually committed, not the
        // requested frontier: a replayed CONFIRM that stalls on a pending
        // WAL write must not suppress a later CONFIRM for those entries.
        if committed_lsn > inner.confirmed_lsn {
            inner.confirmed_lsn = committed_lsn;
        }
        drop(inner);
        self.wait_cond.notify_all();
    }

    /// Apply a ROLLBACK at `lsn`: roll back every entry from the tail down
    /// to the lowest-LSN ack-waiting entry covered by the decision.
    pub fn read_rollback(&self, lsn: Lsn) {
        let mut inner = self.lock();
        debug_assert!(!inner.owner_id.is_nil());

        let mut cut = None;
        for (idx, entry) in inner.queue.iter().enumerate().rev() {
            if !entry.txn.has_flag(flags::WAIT_ACK) {
                continue;
            }
            if entry.lsn() < lsn {
                break;
            }
            cut = Some(idx);
        }
        let cut = match cut {
            Some(idx) => idx,
            None => return,
        };

        while inner.queue.len() > cut {
            let entry = Self::abort_locked(&mut inner);
            entry.txn.clear_flag(flags::WAIT_SYNC);
            entry.txn.clear_flag(flags::WAIT_ACK);
            let wal_pending = entry.txn.signature() < 0;
            entry.txn.set_signature(SIGNATURE_SYNC_ROLLBACK);
            if wal_pending {
                // The WAL write has not resolved: run completion under the
                // current task and let the original owner receive the final
                // wakeup from the WAL callback.
                let saved = entry.txn.swap_owner(Some(TaskHandle::current()));
                entry.txn.complete();
                entry.txn.set_owner(saved);
            } else {
                entry.txn.complete();
            }
        }
        drop(inner);
        self.wait_cond.notify_all();
    }

    // ── Waiter coordination ────────────────────────────────────────────

    /// Block the producer until its entry is committed or rolled back.
    ///
    /// A producer whose entry heads the queue when the synchro timeout
    /// expires writes the ROLLBACK itself and cascades it over the whole
    /// queue; everyone else in the cascade reports the timeout as well.
    pub fn wait_complete(&self, entry: &Arc<LimboEntry>) -> LimboResult<()> {
        debug_assert!(entry.lsn() > 0 || !entry.txn.has_flag(flags::WAIT_ACK));
        if entry.is_complete() {
            return Self::completion_outcome(entry);
        }
        debug_assert!(!entry.txn.is_done());
        debug_assert!(entry.txn.has_flag(flags::WAIT_SYNC));

        let start = Instant::now();
        let mut inner = self.lock();
        loop {
            // Both tunables are live: re-derive the deadline on every pass
            // (a parameter change broadcasts the condition).
            let deadline = start + self.params.timeout();
            let now = Instant::now();
            let timed_out = if now >= deadline {
                true
            } else {
                let (guard, res) = self
                    .wait_cond
                    .wait_timeout(inner, deadline - now)
                    .unwrap_or_else(|e| e.into_inner());
                inner = guard;
                res.timed_out()
            };
            if entry.is_complete() {
                drop(inner);
                return Self::completion_outcome(entry);
            }
            if timed_out {
                break;
            }
        }

        debug_assert!(!inner.queue.is_empty());
        let is_head = inner
            .queue
            .front()
            .is_some_and(|head| Arc::ptr_eq(head, entry));
        if !is_head {
            // Not the first timed out entry: another producer is already
            // writing the rollback. Wait for its cascade to reach us.
            while !entry.is_complete() {
                inner = self
                    .wait_cond
                    .wait(inner)
                    .unwrap_or_else(|e| e.into_inner());
            }
            drop(inner);
            return Self::completion_outcome(entry);
        }
        drop(inner);
        self.timeout_rollback(entry)
    }

    /// Head-of-queue timeout: write a ROLLBACK at the entry's LSN, then
    /// roll back every entry from the tail down to it.
    fn timeout_rollback(&self, entry: &Arc<LimboEntry>) -> LimboResult<()> {
        let _gate = self.decision_gate.lock();
        if entry.is_complete() {
            // A decision landed while we contended for the gate.
            return Self::completion_outcome(entry);
        }
        self.write_decision(DecisionKind::Rollback, entry.lsn())?;

        let mut inner = self.lock();
        if entry.is_complete() {
            // A replayed decision resolved the entry during the journal
            // write.
            drop(inner);
            return Self::completion_outcome(entry);
        }
        loop {
            let victim = Self::abort_locked(&mut inner);
            victim.txn.set_signature(SIGNATURE_QUORUM_TIMEOUT);
            victim.txn.clear_flag(flags::WAIT_SYNC);
            victim.txn.clear_flag(flags::WAIT_ACK);
            victim.txn.complete();
            if Arc::ptr_eq(&victim, entry) {
                break;
            }
        }
        drop(inner);
        // Wake the producers of the other rolled back entries.
        self.wait_cond.notify_all();
        tracing::warn!(lsn = entry.lsn(), "synchro quorum timeout, rolled back the limbo");
        Err(LimboError::SyncQuorumTimeout)
    }

    fn completion_outcome(entry: &LimboEntry) -> LimboResult<()> {
        // The finalizing task completed the transaction before waking us.
        debug_assert!(entry.txn.is_done());
        if entry.is_rollback() {
            if entry.txn.signature() == SIGNATURE_QUORUM_TIMEOUT {
                Err(LimboError::SyncQuorumTimeout)
            } else {
                Err(LimboError::SyncRollback)
            }
        } else {
            Ok(())
        }
    }

    /// Wait until the transaction that is at the tail right now reaches a
    /// terminal state. Success when it commits; an empty limbo succeeds
    /// immediately.
    pub fn wait_confirm(self: &Arc<Self>) -> LimboResult<()> {
        let tail = match self.lock().queue.back() {
            Some(entry) => Arc::clone(entry),
            None => return Ok(()),
        };

        let waitpoint = Arc::new(ConfirmWaitpoint {
            is_confirm: AtomicBool::new(false),
            is_rollback: AtomicBool::new(false),
        });

        let limbo = Arc::clone(self);
        let point = Arc::clone(&waitpoint);
        let on_commit = tail.txn().on_commit(move || {
            point.is_confirm.store(true, Ordering::Release);
            limbo.wait_cond.notify_all();
        });
        let limbo = Arc::clone(self);
        let point = Arc::clone(&waitpoint);
        let on_rollback = tail.txn().on_rollback(move || {
            point.is_rollback.store(true, Ordering::Release);
            limbo.wait_cond.notify_all();
        });
        // Detached on every exit path, fired or not.
        let _triggers = TriggerGuard {
            txn: tail.txn(),
            ids: [on_commit, on_rollback],
        };

        let start = Instant::now();
        let mut inner = self.lock();
        loop {
            // The entry's own flags close the race against a completion
            // that fired before the triggers were installed.
            if waitpoint.is_confirm.load(Ordering::Acquire) || tail.is_commit() {
                drop(inner);
                return Ok(());
            }
            if waitpoint.is_rollback.load(Ordering::Acquire) || tail.is_rollback() {
                drop(inner);
                return Err(LimboError::SyncRollback);
            }
            let deadline = start + self.params.timeout();
            let now = Instant::now();
            if now >= deadline {
                drop(inner);
                return Err(LimboError::SyncQuorumTimeout);
            }
            let (guard, _timeout) = self
                .wait_cond
                .wait_timeout(inner, deadline - now)
                .unwrap_or_else(|e| e.into_inner());
            inner = guard;
        }
    }

    // ── Administrative operations ──────────────────────────────────────

    /// Recovery / promote path: confirm the greatest ack-waiting entry at
    /// or below `confirm_lsn`, then roll back everything above it. Confirm
    /// first so the rollback walk cannot erase confirmed entries.
    pub fn force_empty(&self, confirm_lsn: Lsn) {
        let (last_quorum, rollback) = {
            let inner = self.lock();
            let mut last_quorum = None;
            let mut rollback = None;
            for entry in inner.queue.iter() {
                if !entry.txn.has_flag(flags::WAIT_ACK) {
                    continue;
                }
                if entry.lsn() <= confirm_lsn {
                    last_quorum = Some(entry.lsn());
                } else {
                    rollback = Some(entry.lsn());
                    break;
                }
            }
            (last_quorum, rollback)
        };

        if let Some(lsn) = last_quorum {
            if let Err(err) = self.confirm(lsn) {
                tracing::error!(lsn, error = %err, "failed to write CONFIRM while draining the limbo");
                return;
            }
        }
        if let Some(lsn) = rollback {
            if let Err(err) = self.rollback(lsn) {
                tracing::error!(lsn, error = %err, "failed to write ROLLBACK while draining the limbo");
            }
        }
    }

    /// Re-scan the queue after the synchro tunables changed: a lowered
    /// quorum may already be satisfied by the recorded ack counts. Always
    /// ends with a broadcast so blocked producers re-evaluate their
    /// deadlines against the new timeout.
    pub fn on_parameters_change(&self) {
        let confirm_lsn = {
            let inner = self.lock();
            if inner.queue.is_empty() {
                return;
            }
            let quorum = self.params.quorum();
            let mut confirm_lsn = UNASSIGNED_LSN;
            for entry in inner.queue.iter() {
                if !entry.txn.has_flag(flags::WAIT_ACK) {
                    debug_assert_eq!(entry.lsn(), UNASSIGNED_LSN);
                    if confirm_lsn == UNASSIGNED_LSN {
                        continue;
                    }
                } else if entry.ack_count() < quorum {
                    continue;
                } else {
                    confirm_lsn = entry.lsn();
                    debug_assert!(confirm_lsn > 0);
                }
            }
            confirm_lsn
        };

        if confirm_lsn > 0 {
            if let Err(err) = self.confirm(confirm_lsn) {
                // The new parameters are already in effect; a quorum that
                // is satisfied now has no retry path.
                panic!("failed to write CONFIRM after a parameter change: {err}");
            }
        }
        self.wait_cond.notify_all();
    }
}

/// Waitpoint for `wait_confirm`: which terminal state the tail reached.
struct ConfirmWaitpoint {
    is_confirm: AtomicBool,
    is_rollback: AtomicBool,
}

/// Detaches the `wait_confirm` triggers on every exit path.
struct TriggerGuard<'a> {
    txn: &'a Txn,
    ids: [kestrel_txn::TriggerId; 2],
}

impl Drop for TriggerGuard<'_> {
    fn drop(&mut self) {
        for id in self.ids {
            self.txn.drop_trigger(id);
        }
    }
}
