//! # Tick Scheduler
//!
//! Periodic timers for the throttle ramp.
//!
//! The controller never sleeps itself. It asks a [`Scheduler`] to start a
//! periodic timer and gets back a [`TimerId`]. Every time the timer fires,
//! the id is delivered back to the event loop, which hands it to the
//! controller. Ids are never reused, so a fire that was already queued when
//! its timer got cancelled can be recognised and dropped.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::trace;

/// Identifies one started timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl TimerId {
    /// Returns the raw sequence number.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Starts and cancels periodic timers.
pub trait Scheduler {
    /// Starts a periodic timer. The first fire happens one full `period`
    /// after the call.
    fn start(&mut self, period: Duration) -> TimerId;

    /// Cancels a timer. Cancelling an unknown or already cancelled id is a no-op.
    fn cancel(&mut self, id: TimerId);
}

/// [`Scheduler`] backed by tokio tasks.
///
/// Each running timer is a task that posts its [`TimerId`] on the channel
/// returned by [`TokioScheduler::new`].
#[derive(Debug)]
pub struct TokioScheduler {
    next_id: u64,
    fires: mpsc::UnboundedSender<TimerId>,
    running: HashMap<TimerId, JoinHandle<()>>,
}

impl TokioScheduler {
    /// Creates a scheduler and the receiver its timers fire into.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerId>) {
        let (fires, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            next_id: 0,
            fires,
            running: HashMap::new(),
        };
        (scheduler, rx)
    }

    /// Number of timers currently running.
    #[must_use]
    pub fn running(&self) -> usize {
        self.running.len()
    }
}

impl Scheduler for TokioScheduler {
    fn start(&mut self, period: Duration) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        let fires = self.fires.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if fires.send(id).is_err() {
                    // Event loop is gone
                    break;
                }
            }
        });

        trace!("Started timer {} ({:?})", id.0, period);
        self.running.insert(id, handle);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(handle) = self.running.remove(&id) {
            handle.abort();
            trace!("Cancelled timer {}", id.0);
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.running.drain() {
            handle.abort();
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_each_period() {
        let (mut scheduler, mut fires) = TokioScheduler::new();
        let id = scheduler.start(Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(fires.try_recv().is_err(), "Should not fire before one period");

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(fires.try_recv().unwrap(), id);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fires.try_recv().unwrap(), id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_stops_firing() {
        let (mut scheduler, mut fires) = TokioScheduler::new();
        let id = scheduler.start(Duration::from_millis(100));
        assert_eq!(scheduler.running(), 1);

        scheduler.cancel(id);
        assert_eq!(scheduler.running(), 0);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(fires.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ids_are_unique() {
        let (mut scheduler, _fires) = TokioScheduler::new();
        let first = scheduler.start(Duration::from_millis(10));
        scheduler.cancel(first);
        let second = scheduler.start(Duration::from_millis(10));

        assert_ne!(first, second);
        assert!(second.get() > first.get());
    }

    #[test]
    fn test_manual_scheduler_tracks_active_timers() {
        let mut scheduler = mocks::ManualScheduler::new();
        let a = scheduler.start(Duration::from_millis(100));
        let b = scheduler.start(Duration::from_millis(100));
        scheduler.cancel(a);

        assert_eq!(scheduler.active(), vec![b]);
    }
}
