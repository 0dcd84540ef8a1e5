//! Tick source abstraction.
//!
//! A [`TimingClock`] hands out one [`ClockHandle`] per subscription. Ticks for
//! a subscription stop once its handle is released or dropped.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Identifies one clock subscription so stale ticks can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The id that follows this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Raw value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// One tick delivered by a clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    /// Subscription that produced the tick
    pub subscription: SubscriptionId,
    /// Wall-clock time elapsed since the previous tick
    pub delta: Duration,
}

/// Repeating tick source.
pub trait TimingClock: Send {
    /// Begin ticking for `id` until the returned handle is released.
    fn subscribe(&mut self, id: SubscriptionId) -> ClockHandle;
}

type CancelFn = Box<dyn FnOnce() + Send>;

/// Live clock subscription. Releasing (or dropping) it cancels the ticks.
pub struct ClockHandle {
    id: SubscriptionId,
    cancel: Option<CancelFn>,
}

impl ClockHandle {
    /// Handle that runs `cancel` exactly once when released.
    pub fn new(id: SubscriptionId, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id,
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Handle with nothing to cancel.
    pub fn detached(id: SubscriptionId) -> Self {
        Self { id, cancel: None }
    }

    /// Subscription this handle controls.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Cancel the subscription.
    pub fn release(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for ClockHandle {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for ClockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClockHandle")
            .field("id", &self.id)
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

/// Bookkeeping shared between a [`ManualClock`] and its monitors.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ManualClockStats {
    /// Subscription currently ticking
    pub active: Option<SubscriptionId>,
    /// Total subscriptions created
    pub subscribed: usize,
    /// Total subscriptions released
    pub released: usize,
}

/// Clock with no timer behind it; the host drives ticks by hand.
///
/// Used by tests and by hosts that already own a frame callback.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    stats: Arc<Mutex<ManualClockStats>>,
}

impl ManualClock {
    /// New clock with no subscriptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observer onto this clock's subscriptions.
    pub fn monitor(&self) -> ClockMonitor {
        ClockMonitor {
            stats: Arc::clone(&self.stats),
        }
    }
}

impl TimingClock for ManualClock {
    fn subscribe(&mut self, id: SubscriptionId) -> ClockHandle {
        if let Ok(mut stats) = self.stats.lock() {
            stats.active = Some(id);
            stats.subscribed += 1;
        }

        let stats = Arc::clone(&self.stats);
        ClockHandle::new(id, move || {
            if let Ok(mut stats) = stats.lock() {
                if stats.active == Some(id) {
                    stats.active = None;
                }
                stats.released += 1;
            }
        })
    }
}

/// Read-only view of a [`ManualClock`].
#[derive(Debug, Clone)]
pub struct ClockMonitor {
    stats: Arc<Mutex<ManualClockStats>>,
}

impl ClockMonitor {
    /// Current counters.
    pub fn stats(&self) -> ManualClockStats {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Whether a subscription is ticking.
    pub fn is_active(&self) -> bool {
        self.stats().active.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_release_runs_cancel_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handle = ClockHandle::new(SubscriptionId::new(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        handle.release();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_cancels() {
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let counter = Arc::clone(&calls);
            let _handle = ClockHandle::new(SubscriptionId::new(7), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_manual_clock_tracks_subscriptions() {
        let mut clock = ManualClock::new();
        let monitor = clock.monitor();

        let first = clock.subscribe(SubscriptionId::new(1));
        assert_eq!(monitor.stats().active, Some(SubscriptionId::new(1)));
        first.release();
        assert!(!monitor.is_active());

        let second = clock.subscribe(SubscriptionId::new(2));
        drop(second);

        let stats = monitor.stats();
        assert_eq!(stats.subscribed, 2);
        assert_eq!(stats.released, 2);
        assert_eq!(stats.active, None);
    }

    #[test]
    fn test_subscription_id_next() {
        let id = SubscriptionId::new(41);
        assert_eq!(id.next().get(), 42);
        assert_eq!(id.to_string(), "sub-41");
    }
}
