use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Run `f` every `interval` until `shutdown` is cancelled. The first run is
/// immediate; a run that overruns delays the next one instead of bunching up.
pub async fn loop_with_interval<Fut: Future<Output = ()>>(
    interval: Duration,
    shutdown: &CancellationToken,
    f: impl Fn() -> Fut,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }
        f().await;
    }
}

/// The current time as seen by the tokio clock, so that paused test time
/// also drives route timers.
pub fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn runs_until_cancelled() {
        let shutdown = CancellationToken::new();
        let count = Arc::new(AtomicUsize::new(0));

        let task = {
            let shutdown = shutdown.clone();
            let count = count.clone();
            tokio::spawn(async move {
                loop_with_interval(Duration::from_secs(2), &shutdown, || async {
                    count.fetch_add(1, Ordering::SeqCst);
                })
                .await;
            })
        };

        tokio::time::sleep(Duration::from_secs(5)).await;
        shutdown.cancel();
        task.await.unwrap();

        // t = 0, 2, 4
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn period_does_not_drift_with_slow_runs() {
        let shutdown = CancellationToken::new();
        let starts = Arc::new(Mutex::new(Vec::new()));

        let task = {
            let shutdown = shutdown.clone();
            let starts = starts.clone();
            tokio::spawn(async move {
                loop_with_interval(Duration::from_secs(2), &shutdown, || async {
                    starts.lock().unwrap().push(tokio::time::Instant::now());
                    tokio::time::sleep(Duration::from_millis(500)).await;
                })
                .await;
            })
        };

        tokio::time::sleep(Duration::from_secs(7)).await;
        shutdown.cancel();
        task.await.unwrap();

        let starts = starts.lock().unwrap();
        assert_eq!(starts.len(), 4);
        for pair in starts.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::from_secs(2));
        }
    }
}
