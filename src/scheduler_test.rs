use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::*;

fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
    let hits = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&hits);
    (hits, move || {
        inner.fetch_add(1, Ordering::SeqCst);
    })
}

async fn settle() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn fires_after_delay() {
    let (hits, work) = counter();
    let _task = ScheduledTask::after(Duration::from_secs(3), work);
    settle().await;

    tokio::time::advance(Duration::from_millis(2_999)).await;
    settle().await;
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    tokio::time::advance(Duration::from_millis(1)).await;
    settle().await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn drop_aborts_pending_work() {
    let (hits, work) = counter();
    let task = ScheduledTask::after(Duration::from_secs(3), work);
    settle().await;
    drop(task);

    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn after_async_awaits_future() {
    let hits = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&hits);
    let _task = ScheduledTask::after_async(Duration::from_secs(5), async move {
        inner.fetch_add(1, Ordering::SeqCst);
    });
    settle().await;

    tokio::time::advance(Duration::from_secs(5)).await;
    settle().await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
