//! Task handles for threads blocked inside the synchronous-replication
//! protocols.
//!
//! A `TaskHandle` stands in for a cooperative scheduler's task reference:
//! it identifies the thread that owns a blocking operation and lets another
//! thread wake it. Waking is sticky (a `wake` delivered before the target
//! parks makes its next park return immediately), so check-then-park loops
//! cannot miss a wakeup.

use std::thread::{self, Thread, ThreadId};

/// Clone-able handle to a thread participating in a blocking protocol.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    thread: Thread,
}

impl TaskHandle {
    /// Handle to the calling thread.
    pub fn current() -> Self {
        Self {
            thread: thread::current(),
        }
    }

    /// Wake the task. Sticky: at most one pending wake is remembered.
    pub fn wake(&self) {
        self.thread.unpark();
    }

    pub fn id(&self) -> ThreadId {
        self.thread.id()
    }
}

impl PartialEq for TaskHandle {
    fn eq(&self, other: &Self) -> bool {
        self.thread.id() == other.thread.id()
    }
}

impl Eq for TaskHandle {}
