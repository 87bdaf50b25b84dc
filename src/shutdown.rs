//! Cooperative cancellation for the bucket queue.
//!
//! Mid-seek cancellation is not supported: interrupting a gesture leaves the
//! slider in an unknown spot and risks a torn bucket. The only granularity is
//! "abandon the remaining bucket queue", so the driver checks this flag
//! between buckets and finishes the one in flight.

use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Shared handle to a shutdown flag.
pub type SharedShutdown = Arc<ShutdownFlag>;

static GLOBAL_SHUTDOWN: OnceCell<SharedShutdown> = OnceCell::new();

/// Register the process-wide shutdown handle (first registration wins).
pub fn set_global(handle: SharedShutdown) {
    let _ = GLOBAL_SHUTDOWN.set(handle);
}

/// The registered process-wide shutdown handle, if any.
pub fn global() -> Option<SharedShutdown> {
    GLOBAL_SHUTDOWN.get().cloned()
}

/// One-way abort flag with async notification.
#[derive(Debug, Default)]
pub struct ShutdownFlag {
    requested: AtomicBool,
    notify: Notify,
}

impl ShutdownFlag {
    /// New shared flag.
    pub fn shared() -> SharedShutdown {
        Arc::new(Self::default())
    }

    /// Request abort of the remaining bucket queue. Idempotent; waiters are
    /// notified once.
    pub fn request(&self) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    /// Whether abort has been requested.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Wait until abort is requested; returns immediately if it already was.
    pub async fn wait(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a request landing in between
        // cannot be missed.
        notified.as_mut().enable();
        if self.is_requested() {
            return;
        }
        notified.await;
    }
}
