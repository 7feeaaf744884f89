//! Millisecond time sources used to compute replenishment.

use std::convert::TryFrom;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

/// A monotonic source of millisecond timestamps.
///
/// Implementations must never go backwards. Callers still saturate negative
/// deltas to zero, so a misbehaving clock only stalls replenishment.
pub trait Clock {
    /// Current time in milliseconds since an arbitrary, fixed epoch.
    fn now(&self) -> u64;
}

/// A clock which follows [`tokio::time::Instant`].
///
/// This respects a paused Tokio runtime, so tests using
/// `#[tokio::test(start_paused = true)]` observe the same virtual time that
/// [`tokio::time::sleep`] advances.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    epoch: Instant,
}

impl TokioClock {
    /// Construct a clock whose epoch is the current instant.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    #[inline]
    fn now(&self) -> u64 {
        let elapsed = Instant::now().saturating_duration_since(self.epoch);
        u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a parent and child bucket built
/// from clones of one `ManualClock` observe the same timestamps.
///
/// # Examples
///
/// ```
/// use drip_limiter::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let other = clock.clone();
///
/// clock.advance(Duration::from_millis(250));
/// assert_eq!(other.now(), 250);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    /// Construct a new manual clock starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by the given duration.
    pub fn advance(&self, duration: Duration) {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        let mut current = self.millis.load(Ordering::SeqCst);

        loop {
            let next = current.saturating_add(millis);

            match self.millis.compare_exchange_weak(
                current,
                next,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }

    /// Set the clock to an absolute number of milliseconds.
    ///
    /// Setting a value lower than the current one is permitted to simulate a
    /// misbehaving time source.
    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}
