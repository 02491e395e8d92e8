//! Cancellable one-shot timers.
//!
//! Debounced hide/show behavior needs a single pending task per purpose,
//! replaced on every reschedule so timers never stack.

use std::time::Duration;
use tokio::task::JoinHandle;

/// One named slot for a delayed action. Scheduling cancels whatever was
/// pending; cancelling is always safe.
#[derive(Default)]
pub struct ScheduledTask {
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any pending action with `action`, to run after `delay`.
    /// Outside a tokio runtime the action is skipped.
    pub fn schedule(&mut self, delay: Duration, action: impl FnOnce() + Send + 'static) {
        self.cancel();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            self.handle = Some(runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                action();
            }));
        } else {
            log::debug!("no runtime, dropping scheduled action");
        }
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_pending_action() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut task = ScheduledTask::new();

        let counted = Arc::clone(&fired);
        task.schedule(Duration::from_millis(100), move || {
            counted.fetch_add(1, Ordering::SeqCst);
        });
        let counted = Arc::clone(&fired);
        task.schedule(Duration::from_millis(100), move || {
            counted.fetch_add(10, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_action() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut task = ScheduledTask::new();

        let counted = Arc::clone(&fired);
        task.schedule(Duration::from_millis(50), move || {
            counted.fetch_add(1, Ordering::SeqCst);
        });
        task.cancel();
        assert!(!task.is_pending());

        tokio::time::sleep(Duration::from_millis(100)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
