use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Synchronous-replication section of the node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// Minimum number of replicas (the leader included) that must
    /// acknowledge a synchronous transaction before it is confirmed.
    #[serde(default = "default_synchro_quorum")]
    pub synchro_quorum: usize,
    /// Seconds a producer waits for quorum before the limbo starts a
    /// rollback cascade.
    #[serde(default = "default_synchro_timeout_secs")]
    pub synchro_timeout_secs: f64,
}

fn default_synchro_quorum() -> usize {
    1
}

fn default_synchro_timeout_secs() -> f64 {
    5.0
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            synchro_quorum: default_synchro_quorum(),
            synchro_timeout_secs: default_synchro_timeout_secs(),
        }
    }
}

/// Live view of the synchro tunables.
///
/// The limbo re-reads both values on every wait / scan pass, so updates
/// take effect for transactions already in flight. After retuning, call
/// `Limbo::on_parameters_change` so that blocked producers re-evaluate
/// their deadlines and newly satisfiable quorums are confirmed.
#[derive(Debug)]
pub struct SynchroParams {
    quorum: AtomicUsize,
    timeout_us: AtomicU64,
}

impl SynchroParams {
    pub fn new(cfg: &ReplicationConfig) -> Self {
        Self {
            quorum: AtomicUsize::new(cfg.synchro_quorum.max(1)),
            timeout_us: AtomicU64::new(secs_to_us(cfg.synchro_timeout_secs)),
        }
    }

    pub fn quorum(&self) -> usize {
        self.quorum.load(Ordering::Relaxed)
    }

    /// Set the quorum. Clamped to at least 1: the leader always counts.
    pub fn set_quorum(&self, quorum: usize) {
        self.quorum.store(quorum.max(1), Ordering::Relaxed);
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_micros(self.timeout_us.load(Ordering::Relaxed))
    }

    pub fn set_timeout(&self, timeout: Duration) {
        self.timeout_us
            .store(timeout.as_micros() as u64, Ordering::Relaxed);
    }
}

impl Default for SynchroParams {
    fn default() -> Self {
        Self::new(&ReplicationConfig::default())
    }
}

fn secs_to_us(secs: f64) -> u64 {
    (secs.max(0.0) * 1_000_000.0) as u64
}
