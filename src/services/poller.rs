use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::Result;

/// Owner side of a refresh loop. Dropping it stops the loop.
pub struct PollHandle {
    cancel: watch::Sender<bool>,
    refresh: Arc<Notify>,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn refresh_now(&self) {
        self.refresh.notify_one();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the loop, abandoning any fetch still in flight.
    pub async fn cancel(self) {
        let _ = self.cancel.send(true);
        let _ = self.task.await;
    }
}

// Ticks that arrive while a fetch is running are skipped, so fetches never overlap.
pub fn spawn<T, F, Fut>(
    name: &'static str,
    period: Duration,
    fetch: F,
) -> (PollHandle, mpsc::Receiver<Result<T>>)
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(4);
    let (cancel, mut cancelled) = watch::channel(false);
    let refresh = Arc::new(Notify::new());
    let wake = refresh.clone();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("{name}: polling every {period:?}");

        loop {
            tokio::select! {
                _ = cancelled.changed() => break,
                _ = ticker.tick() => {}
                _ = wake.notified() => {
                    debug!("{name}: manual refresh");
                    ticker.reset();
                }
            }

            let outcome = tokio::select! {
                _ = cancelled.changed() => break,
                outcome = fetch() => outcome,
            };

            if tx.send(outcome).await.is_err() {
                break;
            }
        }

        debug!("{name}: stopped");
    });

    (
        PollHandle {
            cancel,
            refresh,
            task,
        },
        rx,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_polls_on_interval_until_cancelled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let (handle, mut rx) = spawn("test", Duration::from_secs(30), move || {
            let counter = counter.clone();
            async move { Ok(counter.fetch_add(1, Ordering::SeqCst)) }
        });

        assert_eq!(rx.recv().await.unwrap().unwrap(), 0);
        assert_eq!(rx.recv().await.unwrap().unwrap(), 1);
        assert_eq!(rx.recv().await.unwrap().unwrap(), 2);

        handle.cancel().await;
        let mut leftover = 0;
        while rx.recv().await.is_some() {
            leftover += 1;
        }
        assert!(leftover <= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_abandons_in_flight_fetch() {
        let (handle, mut rx) = spawn("slow", Duration::from_secs(1), || async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.cancel().await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_loop_and_errors_are_delivered() {
        let (handle, mut rx) = spawn("failing", Duration::from_secs(5), || async {
            Err::<(), _>(DashboardError::EmptySeries)
        });

        assert!(matches!(
            rx.recv().await.unwrap(),
            Err(DashboardError::EmptySeries)
        ));
        drop(handle);
        while rx.recv().await.is_some() {}
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_skips_the_wait() {
        let (handle, mut rx) = spawn("manual", Duration::from_secs(3600), || async { Ok(1u8) });
        rx.recv().await.unwrap().unwrap();

        let started = tokio::time::Instant::now();
        handle.refresh_now();
        rx.recv().await.unwrap().unwrap();
        assert!(started.elapsed() < Duration::from_secs(3600));
        handle.cancel().await;
    }
}
