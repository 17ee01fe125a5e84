//! A cloneable handle for poking the router from external code.

use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio_util::sync::CancellationToken;

/// A cloneable handle for aborting the active call from another task
/// (e.g. a Ctrl-C listener).
///
/// All fields are `Arc`-wrapped, so cloning is cheap.
#[derive(Clone, Default)]
pub struct RouterHandle {
    pub(crate) cancel: Arc<Mutex<CancellationToken>>,
    pub(crate) is_running: Arc<AtomicBool>,
}

impl RouterHandle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Abort the active call. No-op when idle.
    pub fn abort(&self) {
        if self.is_running() {
            self.cancel.lock().cancel();
        }
    }

    /// Whether a call is currently streaming.
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    /// Mark a call as started and hand out a fresh token for it.
    pub(crate) fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.cancel.lock() = token.clone();
        self.is_running.store(true, Ordering::Release);
        token
    }

    pub(crate) fn finish(&self) {
        self.is_running.store(false, Ordering::Release);
    }
}
