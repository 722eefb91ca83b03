//! Periodic recomputation of the roast timer display
//!
//! The ticker owns the only recurring task in the application. It reads the
//! timer on a fixed cadence and publishes whole elapsed seconds on a watch
//! channel. The task is aborted on cancel and when the ticker is dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use shared::{Clock, SessionTimer};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Timer shared between the session and its polling task
pub type SharedTimer<C> = Arc<Mutex<SessionTimer<C>>>;

pub fn lock_timer<C: Clock>(timer: &SharedTimer<C>) -> MutexGuard<'_, SessionTimer<C>> {
    timer.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ElapsedTicker {
    tx: Arc<watch::Sender<u64>>,
    handle: Option<JoinHandle<()>>,
}

impl Default for ElapsedTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl ElapsedTicker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            tx: Arc::new(tx),
            handle: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }

    /// Begin polling `timer` every `every`. Any previous task is cancelled.
    /// Without a Tokio runtime nothing is scheduled; readers can still query
    /// the timer directly.
    pub fn start<C>(&mut self, timer: SharedTimer<C>, every: Duration)
    where
        C: Clock + Send + 'static,
    {
        self.cancel();

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::debug!("No async runtime; elapsed time will not be polled");
                return;
            }
        };

        let tx = Arc::clone(&self.tx);
        self.handle = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let seconds = lock_timer(&timer).elapsed_seconds();
                tx.send_replace(seconds);
            }
        }));
    }

    /// Push a value outside the polling cadence (after pause, stop or reset)
    pub fn publish(&self, seconds: u64) {
        self.tx.send_replace(seconds);
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ElapsedTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ManualClock;

    #[tokio::test]
    async fn test_publishes_clock_based_elapsed() {
        let clock = ManualClock::new();
        let timer: SharedTimer<ManualClock> = Arc::new(Mutex::new(SessionTimer::new(clock.clone())));
        lock_timer(&timer).start();

        let mut ticker = ElapsedTicker::new();
        let mut rx = ticker.subscribe();
        ticker.start(Arc::clone(&timer), Duration::from_millis(5));
        assert!(ticker.is_active());

        clock.advance(Duration::from_secs(3));
        let seen = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| *s == 3)).await;
        assert!(seen.is_ok());

        ticker.cancel();
        assert!(!ticker.is_active());
    }

    #[tokio::test]
    async fn test_cancel_stops_updates() {
        let clock = ManualClock::new();
        let timer: SharedTimer<ManualClock> = Arc::new(Mutex::new(SessionTimer::new(clock.clone())));
        lock_timer(&timer).start();

        let mut ticker = ElapsedTicker::new();
        let rx = ticker.subscribe();
        ticker.start(Arc::clone(&timer), Duration::from_millis(5));
        ticker.cancel();

        clock.advance(Duration::from_secs(10));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(*rx.borrow(), 0);
    }

    #[test]
    fn test_start_without_runtime_is_inert() {
        let timer: SharedTimer<ManualClock> =
            Arc::new(Mutex::new(SessionTimer::new(ManualClock::new())));
        let mut ticker = ElapsedTicker::new();
        ticker.start(timer, Duration::from_millis(5));
        assert!(!ticker.is_active());
    }
}
