//! Scoped one-shot timers.
//!
//! A [`TimerHandle`] owns the task that delivers its event. Dropping the
//! handle cancels the timer, so a timer never outlives the screen or cache
//! key that scheduled it.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Deliver `event` on `sender` after `delay`, unless cancelled first.
    pub fn schedule<T>(delay: Duration, sender: mpsc::Sender<T>, event: T) -> Self
    where
        T: Send + 'static,
    {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if sender.send(event).await.is_err() {
                tracing::trace!("timer fired after event loop closed");
            }
        });
        Self { task }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
