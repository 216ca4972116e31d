//! Cancellable timers on the tokio runtime.
//!
//! Every delayed or periodic callback in the crate goes through a
//! [`Scheduler`], so tests can pause and advance time deterministically.
//! Dropping a [`ScheduledTask`] aborts it.

use std::future::Future;
use std::time::Duration;

use tokio::runtime::{Handle, TryCurrentError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Spawns delayed and periodic work on a tokio runtime.
#[derive(Debug, Clone)]
pub struct Scheduler {
    handle: Handle,
}

impl Scheduler {
    /// Creates a scheduler on `handle`.
    #[must_use]
    pub const fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Creates a scheduler on the runtime the caller is running in.
    pub fn current() -> Result<Self, TryCurrentError> {
        Handle::try_current().map(Self::new)
    }

    /// Runs `fut` once, `delay` from now.
    pub fn after<F>(&self, delay: Duration, fut: F) -> ScheduledTask
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let deadline = tokio::time::Instant::now() + delay;
        let handle = self.handle.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            fut.await;
        });
        ScheduledTask { handle }
    }

    /// Runs `tick` every `period`, first after one full period.
    ///
    /// Late ticks are delayed rather than bursted.
    pub fn every<F>(&self, period: Duration, mut tick: F) -> ScheduledTask
    where
        F: FnMut() + Send + 'static,
    {
        let start = tokio::time::Instant::now() + period;
        let handle = self.handle.spawn(async move {
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tick();
            }
        });
        ScheduledTask { handle }
    }
}

/// Milliseconds since page load, for event timestamps.
#[derive(Debug, Clone, Copy)]
pub struct PageClock {
    epoch: tokio::time::Instant,
}

impl PageClock {
    /// Starts the clock now.
    #[must_use]
    pub fn start() -> Self {
        Self {
            epoch: tokio::time::Instant::now(),
        }
    }

    /// Milliseconds elapsed since [`PageClock::start`].
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Handle to a scheduled callback. Aborts the callback when dropped.
#[derive(Debug)]
#[must_use = "dropping a ScheduledTask cancels it"]
pub struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Cancels the callback if it has not run yet.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Returns `true` once the callback has run or been cancelled.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_after_runs_once_after_delay() {
        let scheduler = Scheduler::current().unwrap();
        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);

        let task = scheduler.after(Duration::from_secs(5), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        tokio::task::yield_now().await;

        tokio::time::advance(Duration::from_millis(4999)).await;
        tokio::task::yield_now().await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_millis(1)).await;
        tokio::task::yield_now().await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(task.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_clock_follows_runtime_time() {
        let clock = PageClock::start();
        assert_eq!(clock.now_ms(), 0);
        tokio::time::advance(Duration::from_millis(2500)).await;
        assert_eq!(clock.now_ms(), 2500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_run() {
        let scheduler = Scheduler::current().unwrap();
        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);

        let task = scheduler.after(Duration::from_secs(1), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        task.cancel();

        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_ticks_on_period() {
        let scheduler = Scheduler::current().unwrap();
        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);

        let task = scheduler.every(Duration::from_secs(30), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::task::yield_now().await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        for expected in 1..=3 {
            tokio::time::advance(Duration::from_secs(30)).await;
            tokio::task::yield_now().await;
            assert_eq!(hits.load(Ordering::SeqCst), expected);
        }

        drop(task);
        tokio::time::advance(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }
}
