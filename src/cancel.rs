//! Cooperative cancellation.
//!
//! A pass checks its `CancelFlag` before each record. SIGINT/SIGTERM set the
//! process-wide flag so the record in flight finishes and the checkpoint is
//! left alone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Shared stop request.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    local: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.local.store(true, Ordering::SeqCst);
    }

    /// True once this flag was cancelled or a shutdown signal arrived.
    pub fn is_cancelled(&self) -> bool {
        self.local.load(Ordering::SeqCst) || SHUTDOWN.load(Ordering::SeqCst)
    }
}

/// Route SIGINT and SIGTERM into the shutdown flag.
pub fn install_signal_handlers() {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGINT, on_signal as libc::sighandler_t);
        libc::signal(libc::SIGTERM, on_signal as libc::sighandler_t);
    }
}

#[cfg(unix)]
extern "C" fn on_signal(_: libc::c_int) {
    // Only an atomic store: async-signal-safe
    SHUTDOWN.store(true, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let flag = CancelFlag::new();
        let worker = flag.clone();
        assert!(!worker.is_cancelled());
        flag.cancel();
        assert!(worker.is_cancelled());
    }
}
