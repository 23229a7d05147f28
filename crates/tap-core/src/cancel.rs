use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// A broadcast cancellation flag every blocking wait in the pipeline can
/// observe. Cloning is cheap (it's an `Arc` around a lock + condvar); all
/// clones observe the same cancellation.
///
/// There is no async runtime in this stack, so this is a small
/// hand-rolled primitive rather than `tokio_util::sync::CancellationToken`
/// — every suspension point in the system already parks on a
/// `Condvar`, so cancellation rides the same mechanism.
#[derive(Clone)]
pub struct CancelScope {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelScope {
    /// Create a fresh, not-yet-cancelled scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    /// Request cancellation and wake every thread parked in `park_for`.
    pub fn cancel(&self) {
        let (lock, condvar) = &*self.inner;
        #[allow(clippy::unwrap_used)]
        let mut cancelled = lock.lock().unwrap();
        *cancelled = true;
        condvar.notify_all();
    }

    /// `true` once `cancel()` has been called on this scope (or any clone
    /// of it).
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        let (lock, _) = &*self.inner;
        #[allow(clippy::unwrap_used)]
        {
            *lock.lock().unwrap()
        }
    }

    /// Park the current thread for up to `timeout`, waking early if the
    /// scope is cancelled. Returns `true` if cancellation was observed.
    ///
    /// Every sleep/wait in the system should route through this instead
    /// of `thread::sleep`, so cancellation is never more than one
    /// `timeout` late.
    #[must_use]
    pub fn park_for(&self, timeout: Duration) -> bool {
        let (lock, condvar) = &*self.inner;
        #[allow(clippy::unwrap_used)]
        let cancelled = lock.lock().unwrap();
        if *cancelled {
            return true;
        }
        #[allow(clippy::unwrap_used)]
        let (cancelled, _) = condvar.wait_timeout(cancelled, timeout).unwrap();
        *cancelled
    }
}

impl Default for CancelScope {
    fn default() -> Self {
        Self::new()
    }
}
