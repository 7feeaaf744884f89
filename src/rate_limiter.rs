use core::convert::TryFrom;
use core::fmt;
use core::time::Duration;

use parking_lot::Mutex;
use tokio::time;

use crate::token_bucket::Builder;
use crate::{Clock, Error, Grant, Interval, TokenBucket, TokioClock};

/// Default number of tokens granted per window.
const DEFAULT_TOKENS_PER_INTERVAL: u64 = 1024;
/// Default window length.
const DEFAULT_INTERVAL: Interval = Interval::from_millis(1);

struct Window {
    /// When the current window started.
    start: u64,
    /// Tokens granted within the current window.
    used: u64,
}

impl Window {
    /// Start a new window if the current one has ended, or if the clock moved
    /// backwards.
    fn roll(&mut self, now: u64, interval: Interval) {
        if now < self.start || now - self.start >= interval.as_millis() {
            trace!(start = now, previous = self.start, used = self.used, "new window");
            self.start = now;
            self.used = 0;
        }
    }
}

/// A fixed-window rate limiter.
///
/// At most [`tokens_per_interval`] tokens are granted within a window of
/// [`interval`]. Requests are backed by a token bucket of the same size which
/// starts out full, so that tokens also flow smoothly across window
/// boundaries.
///
/// [`tokens_per_interval`]: RateLimiter::tokens_per_interval
/// [`interval`]: RateLimiter::interval
pub struct RateLimiter<C = TokioClock> {
    bucket: TokenBucket<C>,
    fire_immediately: bool,
    window: Mutex<Window>,
}

impl<C> fmt::Debug for RateLimiter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let window = self.window.lock();

        f.debug_struct("RateLimiter")
            .field("window_start", &window.start)
            .field("used", &window.used)
            .field("fire_immediately", &self.fire_immediately)
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl RateLimiter<TokioClock> {
    /// Construct a limiter driven by the Tokio clock which waits for the next
    /// window once the current one is spent.
    ///
    /// # Examples
    ///
    /// ```
    /// use drip_limiter::{Interval, RateLimiter};
    ///
    /// # #[tokio::main(flavor="current_thread", start_paused=true)] async fn main() {
    /// let limiter = RateLimiter::new(100, Interval::MINUTE);
    /// assert_eq!(limiter.get_tokens_remaining(), 100);
    /// # }
    /// ```
    pub fn new<I>(tokens_per_interval: u64, interval: I) -> Self
    where
        I: Into<Interval>,
    {
        Self::builder()
            .tokens_per_interval(tokens_per_interval)
            .interval(interval)
            .build()
    }

    /// Construct a new [`LimiterBuilder`] for a [`RateLimiter`].
    ///
    /// # Examples
    ///
    /// ```
    /// use drip_limiter::{Interval, RateLimiter};
    ///
    /// # #[tokio::main(flavor="current_thread", start_paused=true)] async fn main() {
    /// let limiter = RateLimiter::builder()
    ///     .tokens_per_interval(150)
    ///     .interval(Interval::HOUR)
    ///     .fire_immediately(true)
    ///     .build();
    ///
    /// assert!(limiter.fire_immediately());
    /// # }
    /// ```
    pub fn builder() -> LimiterBuilder<TokioClock> {
        LimiterBuilder::with_clock(TokioClock::new())
    }
}

impl<C> RateLimiter<C> {
    /// The number of tokens granted per window.
    #[inline]
    pub fn tokens_per_interval(&self) -> u64 {
        self.bucket.capacity()
    }

    /// The length of a window.
    #[inline]
    pub fn interval(&self) -> Interval {
        self.bucket.interval()
    }

    /// Test if requests exceeding the window budget are rejected instead of
    /// waiting, as configured through [`LimiterBuilder::fire_immediately`].
    #[inline]
    pub fn fire_immediately(&self) -> bool {
        self.fire_immediately
    }

    fn exceeded(&self, requested: u64) -> Error {
        Error::CapacityExceeded {
            requested,
            capacity: self.tokens_per_interval(),
        }
    }
}

impl<C> RateLimiter<C>
where
    C: Clock,
{
    /// Remove the given number of tokens.
    ///
    /// If the current window has budget left, tokens are taken from the
    /// underlying bucket right away, which may still suspend if the bucket has
    /// not yet refilled. Otherwise the task is suspended until the window rolls
    /// over, unless the limiter fires immediately in which case
    /// [`Grant::Rejected`] is returned without touching any state.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::CapacityExceeded`] before suspending if `count`
    /// exceeds [`tokens_per_interval`].
    ///
    /// [`tokens_per_interval`]: RateLimiter::tokens_per_interval
    ///
    /// # Examples
    ///
    /// ```
    /// use drip_limiter::{Grant, Interval, RateLimiter, Remaining};
    /// use tokio::time::{Duration, Instant};
    ///
    /// # #[tokio::main(flavor="current_thread", start_paused=true)] async fn main() -> Result<(), drip_limiter::Error> {
    /// let limiter = RateLimiter::new(10, Interval::SECOND);
    /// let start = Instant::now();
    ///
    /// limiter.remove_tokens(10).await?;
    ///
    /// // Waits for the next window.
    /// assert_eq!(limiter.remove_tokens(1).await?, Grant::Granted(Remaining::Tokens(9)));
    /// assert_eq!(start.elapsed(), Duration::from_secs(1));
    /// # Ok(()) }
    /// ```
    pub async fn remove_tokens(&self, count: u64) -> Result<Grant, Error> {
        if count > self.tokens_per_interval() {
            return Err(self.exceeded(count));
        }

        let interval = self.interval();
        let now = self.bucket.clock().now();

        let wait = {
            let mut window = self.window.lock();
            window.roll(now, interval);

            if count > self.tokens_per_interval() - window.used {
                if self.fire_immediately {
                    trace!(count, used = window.used, "rejected");
                    return Ok(Grant::Rejected);
                }

                let end = window.start.saturating_add(interval.as_millis());
                Some(Duration::from_millis(end.saturating_sub(now)))
            } else {
                None
            }
        };

        if let Some(wait) = wait {
            trace!(count, ?wait, "waiting for next window");
            time::sleep(wait).await;
        }

        let remaining = self.bucket.remove_tokens(count).await?;
        self.record(count);
        Ok(Grant::Granted(remaining))
    }

    /// Try to remove the given number of tokens without suspending, returning
    /// `true` if they were removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use drip_limiter::{Interval, RateLimiter};
    ///
    /// # #[tokio::main(flavor="current_thread", start_paused=true)] async fn main() {
    /// let limiter = RateLimiter::new(2, Interval::SECOND);
    ///
    /// assert!(limiter.try_remove_tokens(2));
    /// assert!(!limiter.try_remove_tokens(1));
    /// assert!(!limiter.try_remove_tokens(3));
    /// # }
    /// ```
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self)))]
    pub fn try_remove_tokens(&self, count: u64) -> bool {
        if count > self.tokens_per_interval() {
            return false;
        }

        let now = self.bucket.clock().now();
        let mut window = self.window.lock();
        window.roll(now, self.interval());

        if count > self.tokens_per_interval() - window.used {
            return false;
        }

        if !self.bucket.try_remove_tokens(count) {
            return false;
        }

        window.used += count;
        true
    }

    /// Get the number of tokens currently available in the underlying bucket.
    pub fn get_tokens_remaining(&self) -> u64 {
        self.bucket.get_tokens_remaining()
    }

    /// Refund tokens previously removed.
    ///
    /// The start of the current window moves back by the time it takes to
    /// produce `count` tokens, the window usage is reduced by `count`, and the
    /// underlying bucket is credited.
    ///
    /// # Examples
    ///
    /// ```
    /// use drip_limiter::{Interval, RateLimiter};
    ///
    /// # #[tokio::main(flavor="current_thread", start_paused=true)] async fn main() {
    /// let limiter = RateLimiter::new(10, Interval::SECOND);
    ///
    /// assert!(limiter.try_remove_tokens(10));
    /// limiter.add_tokens(4);
    /// assert_eq!(limiter.window_usage(), 6);
    /// assert!(limiter.try_remove_tokens(4));
    /// # }
    /// ```
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self)))]
    pub fn add_tokens(&self, count: u64) {
        let tokens_per_interval = u128::from(self.tokens_per_interval());

        {
            let mut window = self.window.lock();

            if tokens_per_interval > 0 {
                let shift = u128::from(count) * u128::from(self.interval().as_millis())
                    / tokens_per_interval;
                let shift = u64::try_from(shift).unwrap_or(u64::MAX);
                window.start = window.start.saturating_sub(shift);
            }

            window.used = window.used.saturating_sub(count);
        }

        self.bucket.add_tokens(count);
    }

    /// The number of tokens granted within the current window.
    pub fn window_usage(&self) -> u64 {
        let now = self.bucket.clock().now();
        let mut window = self.window.lock();
        window.roll(now, self.interval());
        window.used
    }

    /// Account for tokens granted by the bucket, in whichever window is current
    /// by the time they were granted.
    fn record(&self, count: u64) {
        let now = self.bucket.clock().now();
        let mut window = self.window.lock();
        window.roll(now, self.interval());
        window.used = window
            .used
            .saturating_add(count)
            .min(self.tokens_per_interval());
    }
}

/// A builder for a [`RateLimiter`].
pub struct LimiterBuilder<C = TokioClock> {
    /// Tokens granted per window.
    tokens_per_interval: u64,
    /// Window length.
    interval: Interval,
    /// Reject instead of waiting when a window is spent.
    fire_immediately: bool,
    clock: C,
}

impl Default for LimiterBuilder<TokioClock> {
    fn default() -> Self {
        Self::with_clock(TokioClock::new())
    }
}

impl<C> LimiterBuilder<C> {
    /// Construct a builder which reads time from the given clock.
    pub fn with_clock(clock: C) -> Self {
        Self {
            tokens_per_interval: DEFAULT_TOKENS_PER_INTERVAL,
            interval: DEFAULT_INTERVAL,
            fire_immediately: false,
            clock,
        }
    }

    /// Configure the number of tokens granted per window. The default value is
    /// `1024`.
    pub fn tokens_per_interval(mut self, tokens_per_interval: u64) -> Self {
        self.tokens_per_interval = tokens_per_interval;
        self
    }

    /// Configure the length of a window. This is 1ms by default.
    pub fn interval<I>(mut self, interval: I) -> Self
    where
        I: Into<Interval>,
    {
        self.interval = interval.into();
        self
    }

    /// Configure the window length by its symbolic name, such as `"second"`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidInterval`] if the name is not recognized.
    pub fn named_interval(self, name: &str) -> Result<Self, Error> {
        Ok(self.interval(name.parse::<Interval>()?))
    }

    /// Configure the limiter to reject requests with [`Grant::Rejected`]
    /// instead of waiting for the next window once the current one is spent.
    ///
    /// This is disabled by default.
    pub fn fire_immediately(mut self, fire_immediately: bool) -> Self {
        self.fire_immediately = fire_immediately;
        self
    }

    /// Construct a new [`RateLimiter`].
    pub fn build(self) -> RateLimiter<C>
    where
        C: Clock,
    {
        let Self {
            tokens_per_interval,
            interval,
            fire_immediately,
            clock,
        } = self;

        let start = clock.now();

        let bucket = Builder::with_clock(clock)
            .capacity(tokens_per_interval)
            .refill(tokens_per_interval)
            .interval(interval)
            .initial(tokens_per_interval)
            .build();

        RateLimiter {
            bucket,
            fire_immediately,
            window: Mutex::new(Window { start, used: 0 }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LimiterBuilder;
    use crate::{Interval, ManualClock, RateLimiter};
    use std::time::Duration;

    fn limiter(clock: &ManualClock, tokens: u64, millis: u64) -> RateLimiter<ManualClock> {
        LimiterBuilder::with_clock(clock.clone())
            .tokens_per_interval(tokens)
            .interval(Interval::from_millis(millis))
            .build()
    }

    #[test]
    fn window_budget_limits_try_remove() {
        let clock = ManualClock::new();
        let limiter = limiter(&clock, 10, 1000);

        assert!(limiter.try_remove_tokens(6));
        assert!(!limiter.try_remove_tokens(5));
        assert!(limiter.try_remove_tokens(4));
        assert_eq!(limiter.window_usage(), 10);
        assert!(!limiter.try_remove_tokens(11));

        clock.advance(Duration::from_millis(1000));
        assert_eq!(limiter.window_usage(), 0);
        assert!(limiter.try_remove_tokens(10));
    }

    #[test]
    fn bucket_refusal_is_not_recorded() {
        let clock = ManualClock::new();
        clock.set(5000);
        let limiter = limiter(&clock, 10, 1000);

        assert!(limiter.try_remove_tokens(10));

        // Moving the clock back opens a new window without refilling the bucket.
        clock.set(4000);
        assert!(!limiter.try_remove_tokens(3));
        assert_eq!(limiter.window_usage(), 0);

        clock.advance(Duration::from_millis(300));
        assert!(limiter.try_remove_tokens(3));
        assert_eq!(limiter.window_usage(), 3);
    }

    #[test]
    fn clock_regression_resets_window() {
        let clock = ManualClock::new();
        clock.set(5000);
        let limiter = limiter(&clock, 4, 1000);

        assert!(limiter.try_remove_tokens(4));
        assert_eq!(limiter.window_usage(), 4);

        clock.set(4000);
        assert_eq!(limiter.window_usage(), 0);
    }

    #[test]
    fn add_tokens_refunds_window_and_bucket() {
        let clock = ManualClock::new();
        clock.set(10_000);
        let limiter = limiter(&clock, 10, 1000);

        assert!(limiter.try_remove_tokens(10));
        assert_eq!(limiter.get_tokens_remaining(), 0);

        limiter.add_tokens(5);
        assert_eq!(limiter.window_usage(), 5);
        assert_eq!(limiter.get_tokens_remaining(), 5);

        // The window start moved back by 500ms, so it ends 500ms early.
        clock.advance(Duration::from_millis(500));
        assert_eq!(limiter.window_usage(), 0);
    }

    #[test]
    fn add_tokens_floors_at_zero() {
        let clock = ManualClock::new();
        let limiter = limiter(&clock, 10, 1000);

        limiter.add_tokens(50);
        assert_eq!(limiter.window_usage(), 0);
        assert_eq!(limiter.get_tokens_remaining(), 10);
    }

    #[test]
    fn zero_tokens_per_interval() {
        let clock = ManualClock::new();
        let limiter = limiter(&clock, 0, 1000);

        assert!(limiter.try_remove_tokens(0));
        assert!(!limiter.try_remove_tokens(1));
        limiter.add_tokens(1);
        assert_eq!(limiter.window_usage(), 0);
    }
}
