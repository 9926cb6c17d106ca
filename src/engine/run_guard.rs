use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::error;

/// Single-flight flag: at most one billing run per orchestrator instance.
///
/// The flag is in-memory only. A process that dies mid-run restarts with a
/// fresh guard, so nothing stays stuck across restarts.
#[derive(Debug, Default)]
pub struct RunGuard {
    running: AtomicBool,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically flip idle to running; `false` if a run is already active
    pub fn try_start(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Flip running back to idle
    pub fn finish(&self) {
        let was_running = self.running.swap(false, Ordering::AcqRel);
        if !was_running {
            error!("Run guard released while idle");
        }
        debug_assert!(was_running, "run guard released while idle");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Start a run, returning a permit that finishes it when dropped
    pub fn try_acquire(self: &Arc<Self>) -> Option<RunPermit> {
        self.try_start().then(|| RunPermit {
            guard: Arc::clone(self),
        })
    }
}

/// Proof of an active run; releases the guard on drop, including when the
/// owning task panics or is aborted
#[derive(Debug)]
pub struct RunPermit {
    guard: Arc<RunGuard>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.guard.finish();
    }
}
