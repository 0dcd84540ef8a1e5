//! Tokio-backed tick source.

use crate::error::{PlayerError, Result};
use std::time::Duration;
use storybar_core::{ClockHandle, ClockTick, SubscriptionId, TimingClock};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::trace;

/// Clock that ticks at a fixed frame interval on the tokio runtime.
///
/// Each tick carries the wall-clock time measured since the previous one, so
/// a late frame advances progress by exactly as much time as really passed.
#[derive(Debug, Clone)]
pub struct IntervalClock {
    period: Duration,
    ticks: mpsc::UnboundedSender<ClockTick>,
    runtime: Handle,
}

impl IntervalClock {
    /// Clock sending ticks every `period` into `ticks`.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn new(period: Duration, ticks: mpsc::UnboundedSender<ClockTick>) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| PlayerError::NoRuntime)?;
        Ok(Self {
            period,
            ticks,
            runtime,
        })
    }

    /// Tick interval.
    pub fn period(&self) -> Duration {
        self.period
    }
}

impl TimingClock for IntervalClock {
    fn subscribe(&mut self, id: SubscriptionId) -> ClockHandle {
        let ticks = self.ticks.clone();
        let period = self.period;

        let task = self.runtime.spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            // The first tick completes immediately
            interval.tick().await;
            let mut last = Instant::now();

            loop {
                interval.tick().await;
                let now = Instant::now();
                let tick = ClockTick {
                    subscription: id,
                    delta: now - last,
                };
                last = now;

                if ticks.send(tick).is_err() {
                    trace!(%id, "tick receiver gone, stopping clock task");
                    break;
                }
            }
        });

        ClockHandle::new(id, move || task.abort())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_runtime() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = IntervalClock::new(Duration::from_millis(10), tx);
        assert!(matches!(result, Err(PlayerError::NoRuntime)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_carry_elapsed_time() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut clock = IntervalClock::new(Duration::from_millis(10), tx).unwrap();
        let handle = clock.subscribe(SubscriptionId::new(3));

        for _ in 0..3 {
            let tick = rx.recv().await.unwrap();
            assert_eq!(tick.subscription, SubscriptionId::new(3));
            assert_eq!(tick.delta, Duration::from_millis(10));
        }

        handle.release();
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_stops_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut clock = IntervalClock::new(Duration::from_millis(10), tx).unwrap();
        let handle = clock.subscribe(SubscriptionId::new(1));

        rx.recv().await.unwrap();
        handle.release();
        while rx.try_recv().is_ok() {}

        time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }
}
