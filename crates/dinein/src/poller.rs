//! Fixed-interval polling shared by the status observer and the kitchen queue.
//!
//! Ticks fire on schedule whether or not earlier fetches have finished, so fetches may
//! overlap and complete out of order. Each fetch carries the sequence number of the tick
//! that started it; the receiving state entity uses it to drop stale results.

use crate::api::ApiResult;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Starts a poller. The first fetch starts immediately.
///
/// `deliver` gets `(sequence, result)` for every fetch that completes before `token` is
/// cancelled; results arriving later are discarded. `finish` runs once after the last
/// tick, and only after every outstanding fetch task has ended, so nothing `deliver` sends
/// can arrive after it.
pub(crate) fn spawn<T, F, Fut, D, DFut, S>(
    name: &'static str,
    every: Duration,
    token: CancellationToken,
    fetch: F,
    deliver: D,
    finish: S,
) -> JoinHandle<()>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ApiResult<T>> + Send + 'static,
    D: Fn(u64, ApiResult<T>) -> DFut + Send + Sync + 'static,
    DFut: Future<Output = ()> + Send + 'static,
    S: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let deliver = Arc::new(deliver);
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut seq: u64 = 0;
        let mut in_flight = JoinSet::new();
        info!(poller = name, ?every, "Poller started");

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                Some(_) = in_flight.join_next() => continue,
                _ = ticker.tick() => {}
            }

            seq += 1;
            let request = fetch();
            let deliver = deliver.clone();
            let token = token.clone();
            in_flight.spawn(async move {
                let result = request.await;
                if token.is_cancelled() {
                    debug!(poller = name, seq, "Discarding result after cancellation");
                    return;
                }
                deliver(seq, result).await;
            });
        }

        // A task past its cancellation check may be mid-delivery. Aborting stops it at its
        // next await; draining makes sure it is gone before `finish` runs.
        in_flight.abort_all();
        while in_flight.join_next().await.is_some() {}

        finish.await;
        info!(poller = name, ticks = seq, "Poller stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_immediately_then_on_interval() {
        let token = CancellationToken::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();

        let task = spawn(
            "test",
            Duration::from_secs(5),
            token.clone(),
            || async { Ok::<_, crate::error::ApiError>(()) },
            move |seq, _| {
                let log = log.clone();
                async move { log.lock().unwrap().push(seq) }
            },
            async {},
        );

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(*seen.lock().unwrap(), vec![1]);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);

        token.cancel();
        task.await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_after_cancel_are_dropped() {
        let token = CancellationToken::new();
        let delivered = Arc::new(Mutex::new(0));
        let count = delivered.clone();

        let task = spawn(
            "test",
            Duration::from_secs(5),
            token.clone(),
            || async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Ok::<_, crate::error::ApiError>(())
            },
            move |_, _| {
                let count = count.clone();
                async move { *count.lock().unwrap() += 1 }
            },
            async {},
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();
        task.await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(*delivered.lock().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finish_runs_after_delivery_in_progress() {
        let token = CancellationToken::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let log = events.clone();
        let done = events.clone();

        let task = spawn(
            "test",
            Duration::from_secs(60),
            token.clone(),
            || async { Ok::<_, crate::error::ApiError>(()) },
            move |seq, _| {
                let log = log.clone();
                async move {
                    log.lock().unwrap().push(format!("deliver {seq}"));
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    log.lock().unwrap().push(format!("delivered {seq}"));
                }
            },
            async move { done.lock().unwrap().push("finish".to_string()) },
        );

        // Cancel while the first delivery is still running
        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();
        task.await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(*events.lock().unwrap(), ["deliver 1", "finish"]);
    }
}
