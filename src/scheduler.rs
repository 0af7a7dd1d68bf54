//! Cancellable deferred work.
//!
//! A `ScheduledTask` owns a spawned timer. Dropping the handle aborts the
//! task, so work tied to a view (a banner revert, a deferred redirect)
//! dies with it instead of firing against stale state.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

#[derive(Debug)]
pub struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Run `work` once `delay` has elapsed.
    pub fn after<F>(delay: Duration, work: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::after_async(delay, async move { work() })
    }

    /// Await `work` once `delay` has elapsed.
    pub fn after_async<Fut>(delay: Duration, work: Fut) -> Self
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            work.await;
        });
        Self { handle }
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
