//! Lifecycle guard: the sole cancellation authority for a monitor instance.
//!
//! Teardown is cooperative. The guard owns every subscription the monitor
//! registered (timer task, page listeners, message listener) and releases
//! them together on the first `teardown()` call. The common trigger for
//! teardown is the environment already disappearing, so release errors are
//! swallowed rather than propagated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

type ReleaseFn = Box<dyn FnOnce() + Send>;

/// One registered resource: a named release action run exactly once.
pub struct Subscription {
    label: &'static str,
    release: ReleaseFn,
}

impl Subscription {
    pub fn new(label: &'static str, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            label,
            release: Box::new(release),
        }
    }

    /// Wrap a spawned task so teardown aborts it.
    pub fn for_task<T: Send + 'static>(label: &'static str, task: &JoinHandle<T>) -> Self {
        let handle = task.abort_handle();
        Self::new(label, move || handle.abort())
    }

    fn run(self) {
        tracing::trace!(subscription = self.label, "releasing");
        (self.release)();
    }
}

struct GuardInner {
    torn_down: AtomicBool,
    subscriptions: Mutex<Vec<Subscription>>,
}

/// Idempotent teardown switch shared by everything inside one monitor.
///
/// Cloning is cheap; all clones observe the same state.
#[derive(Clone)]
pub struct LifecycleGuard {
    inner: Arc<GuardInner>,
}

impl Default for LifecycleGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleGuard {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(GuardInner {
                torn_down: AtomicBool::new(false),
                subscriptions: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Whether teardown has run. Timer callbacks and listeners check this
    /// so anything racing teardown becomes an unobservable no-op.
    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.load(Ordering::SeqCst)
    }

    /// Register a resource for release at teardown. Registering after
    /// teardown releases the resource immediately.
    pub fn register(&self, subscription: Subscription) {
        if self.is_torn_down() {
            subscription.run();
            return;
        }

        let mut subs = match self.inner.subscriptions.lock() {
            Ok(subs) => subs,
            Err(poisoned) => poisoned.into_inner(),
        };

        // Teardown may have won the race while we waited on the lock
        if self.is_torn_down() {
            drop(subs);
            subscription.run();
            return;
        }

        subs.push(subscription);
    }

    /// Release everything. First call wins; later calls are no-ops.
    pub fn teardown(&self) {
        if self.inner.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }

        let drained = {
            let mut subs = match self.inner.subscriptions.lock() {
                Ok(subs) => subs,
                Err(poisoned) => poisoned.into_inner(),
            };
            std::mem::take(&mut *subs)
        };

        tracing::debug!(count = drained.len(), "monitor teardown");
        for sub in drained {
            sub.run();
        }
    }
}
