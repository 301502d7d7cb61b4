//! Debounced trigger for filter-driven refetches.
//!
//! Each trigger cancels the previously scheduled action; only the last
//! trigger in a burst fires, after the window elapses.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

impl Debouncer {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_DEBOUNCE)
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `action` to run after the window; a later trigger within the
    /// window supersedes it.
    pub fn trigger<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let window = self.window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            action().await;
        });

        if let Some(previous) = self.swap(Some(handle)) {
            previous.abort();
        }
    }

    /// Drop whatever is scheduled without running it.
    pub fn cancel(&self) {
        if let Some(previous) = self.swap(None) {
            previous.abort();
        }
    }

    fn swap(&self, next: Option<JoinHandle<()>>) -> Option<JoinHandle<()>> {
        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *pending, next)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
