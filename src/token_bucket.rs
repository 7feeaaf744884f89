use core::convert::TryFrom;
use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use core::time::Duration;
use std::sync::Arc;

use parking_lot::Mutex;
use pin_project_lite::pin_project;
use tokio::time::{self, Sleep};

use crate::{Clock, Error, Interval, Remaining, TokioClock};

/// Default capacity, where `0` means unlimited.
const DEFAULT_CAPACITY: u64 = 0;
/// Default number of tokens added each interval.
const DEFAULT_REFILL: u64 = 1024;
/// Default refill interval.
const DEFAULT_INTERVAL: Interval = Interval::from_millis(1);

struct State {
    /// Tokens currently in the bucket. Never exceeds capacity.
    content: u64,
    /// Timestamp up to which elapsed time has been converted into tokens.
    last_refill: u64,
    /// Replenishment which has not yet amounted to a whole token, measured in
    /// `refill`ths of a millisecond. Always less than the interval.
    carry: u64,
}

/// A token bucket with a fixed capacity which refills at a steady rate.
///
/// See the [crate level documentation] for an overview.
///
/// [crate level documentation]: crate
pub struct TokenBucket<C = TokioClock> {
    capacity: u64,
    refill: u64,
    interval: Interval,
    parent: Option<Arc<TokenBucket<C>>>,
    clock: C,
    state: Mutex<State>,
}

impl<C> fmt::Debug for TokenBucket<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenBucket")
            .field("content", &self.state.lock().content)
            .field("capacity", &self.capacity)
            .field("refill", &self.refill)
            .field("interval", &self.interval)
            .field("parent", &self.parent)
            .finish()
    }
}

impl TokenBucket<TokioClock> {
    /// Construct an empty bucket driven by the Tokio clock.
    ///
    /// A `capacity` of `0` produces an unlimited bucket. A `refill` of `0`
    /// produces a bucket which is topped up to capacity whenever it is
    /// inspected.
    ///
    /// # Examples
    ///
    /// ```
    /// use drip_limiter::{Interval, TokenBucket};
    ///
    /// # #[tokio::main(flavor="current_thread", start_paused=true)] async fn main() {
    /// let bucket = TokenBucket::new(10, 1, Interval::SECOND);
    /// assert_eq!(bucket.get_tokens_remaining(), 0);
    /// # }
    /// ```
    pub fn new<I>(capacity: u64, refill: u64, interval: I) -> Self
    where
        I: Into<Interval>,
    {
        Self::builder()
            .capacity(capacity)
            .refill(refill)
            .interval(interval)
            .build()
    }

    /// Construct a new [`Builder`] for a [`TokenBucket`].
    ///
    /// # Examples
    ///
    /// ```
    /// use drip_limiter::{Interval, TokenBucket};
    ///
    /// # #[tokio::main(flavor="current_thread", start_paused=true)] async fn main() {
    /// let bucket = TokenBucket::builder()
    ///     .capacity(100)
    ///     .refill(10)
    ///     .interval(Interval::SECOND)
    ///     .initial(100)
    ///     .build();
    ///
    /// assert_eq!(bucket.get_tokens_remaining(), 100);
    /// # }
    /// ```
    pub fn builder() -> Builder<TokioClock> {
        Builder::with_clock(TokioClock::new())
    }
}

impl<C> TokenBucket<C> {
    /// The most tokens this bucket can hold, `0` if unlimited.
    #[inline]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// The number of tokens added every [`interval`].
    ///
    /// [`interval`]: TokenBucket::interval
    #[inline]
    pub fn refill(&self) -> u64 {
        self.refill
    }

    /// The refill interval.
    #[inline]
    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// The parent bucket, if any.
    #[inline]
    pub fn parent(&self) -> Option<&Arc<TokenBucket<C>>> {
        self.parent.as_ref()
    }

    #[inline]
    pub(crate) fn clock(&self) -> &C {
        &self.clock
    }

    fn is_unlimited(&self) -> bool {
        self.capacity == 0
    }

    fn refills_instantly(&self) -> bool {
        self.refill == 0 || self.interval.as_millis() == 0
    }

    fn exceeded(&self, requested: u64) -> Error {
        Error::CapacityExceeded {
            requested,
            capacity: self.capacity,
        }
    }

    /// Add replenished tokens for the time elapsed up until `now`.
    ///
    /// Returns `true` if the number of tokens increased.
    fn drip(&self, state: &mut State, now: u64) -> bool {
        let before = state.content;

        if self.refills_instantly() {
            state.content = self.capacity;
            state.last_refill = now;
            state.carry = 0;
            return state.content > before;
        }

        if now < state.last_refill {
            // Clock moved backwards, restart accounting from here.
            state.last_refill = now;
            return false;
        }

        let interval = u128::from(self.interval.as_millis());
        let total = u128::from(now - state.last_refill) * u128::from(self.refill)
            + u128::from(state.carry);

        let added = total / interval;
        let room = u128::from(self.capacity - state.content);
        state.last_refill = now;

        if added >= room {
            state.content = self.capacity;
            state.carry = 0;
        } else {
            // added < room <= u64::MAX and the remainder is below the interval.
            state.content += added as u64;
            state.carry = (total % interval) as u64;
        }

        state.content > before
    }

    /// Estimated time until `deficit` more tokens have dripped in, given the
    /// replenishment already carried over.
    fn wait_for(&self, deficit: u64, carry: u64) -> Duration {
        if self.refills_instantly() {
            return Duration::ZERO;
        }

        let refill = u128::from(self.refill);
        let needed = (u128::from(deficit) * u128::from(self.interval.as_millis()))
            .saturating_sub(u128::from(carry));
        let millis = (needed + refill - 1) / refill;
        Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
    }

    /// Add tokens without dripping first.
    fn credit(&self, count: u64) {
        let mut state = self.state.lock();
        state.content = state.content.saturating_add(count).min(self.capacity);
    }

    /// Return `count` tokens to every ancestor of this bucket.
    fn refund_ancestors(&self, count: u64) {
        let mut next = self.parent.as_deref();

        while let Some(bucket) = next {
            bucket.credit(count);
            next = bucket.parent.as_deref();
        }
    }
}

impl<C> TokenBucket<C>
where
    C: Clock,
{
    /// Remove the given number of tokens, suspending the current task until
    /// they are available in this bucket and every one of its ancestors.
    ///
    /// The returned future resolves to the number of tokens left in the most
    /// constrained bucket of the chain, or [`Remaining::Unlimited`] if this
    /// bucket has no capacity limit.
    ///
    /// Tokens are only deducted once the whole chain can grant them, so
    /// dropping the future before it completes leaves this bucket untouched.
    /// Tokens already granted by ancestors are refunded to them on drop.
    ///
    /// # Errors
    ///
    /// Resolves to [`Error::CapacityExceeded`] on its first poll, without
    /// suspending, if `count` exceeds the capacity of this bucket. The same
    /// error is produced once the request reaches an ancestor which is too
    /// small to ever satisfy it.
    ///
    /// # Examples
    ///
    /// ```
    /// use drip_limiter::{Interval, Remaining, TokenBucket};
    /// use tokio::time::{Duration, Instant};
    ///
    /// # #[tokio::main(flavor="current_thread", start_paused=true)] async fn main() -> Result<(), drip_limiter::Error> {
    /// let bucket = TokenBucket::new(10, 1, Interval::from_millis(100));
    /// let start = Instant::now();
    ///
    /// assert_eq!(bucket.remove_tokens(10).await?, Remaining::Tokens(0));
    /// assert_eq!(start.elapsed(), Duration::from_secs(1));
    ///
    /// assert!(bucket.remove_tokens(11).await.is_err());
    /// # Ok(()) }
    /// ```
    pub fn remove_tokens(&self, count: u64) -> RemoveTokens<'_, C> {
        RemoveTokens {
            bucket: self,
            count,
            granted: None,
            step: Step::Idle,
        }
    }

    /// Try to remove the given number of tokens without suspending, returning
    /// `true` if they were removed from this bucket and every ancestor.
    ///
    /// Local availability is confirmed before any ancestor is consulted, and
    /// this bucket stays locked while they are, so a failure never leaves
    /// tokens deducted anywhere in the chain.
    ///
    /// # Examples
    ///
    /// ```
    /// use drip_limiter::{Interval, TokenBucket};
    ///
    /// # #[tokio::main(flavor="current_thread", start_paused=true)] async fn main() {
    /// let bucket = TokenBucket::builder()
    ///     .capacity(5)
    ///     .refill(1)
    ///     .interval(Interval::SECOND)
    ///     .initial(5)
    ///     .build();
    ///
    /// assert!(bucket.try_remove_tokens(5));
    /// assert!(!bucket.try_remove_tokens(1));
    /// assert!(!bucket.try_remove_tokens(6));
    /// # }
    /// ```
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self)))]
    pub fn try_remove_tokens(&self, count: u64) -> bool {
        if self.is_unlimited() {
            return true;
        }

        if count > self.capacity {
            return false;
        }

        let mut state = self.state.lock();
        self.catch_up(&mut state);

        if state.content < count {
            trace!(content = state.content, "not enough tokens");
            return false;
        }

        if let Some(parent) = &self.parent {
            if !parent.try_remove_tokens(count) {
                trace!("parent refused");
                return false;
            }
        }

        state.content -= count;
        true
    }

    /// Get the number of tokens currently in the bucket.
    ///
    /// This does not account for ancestors, which may hold fewer tokens.
    pub fn get_tokens_remaining(&self) -> u64 {
        let mut state = self.state.lock();
        self.catch_up(&mut state);
        state.content
    }

    /// Credit the given number of tokens back to the bucket, saturating at its
    /// capacity.
    ///
    /// Ancestors are not credited.
    ///
    /// # Examples
    ///
    /// ```
    /// use drip_limiter::{Interval, TokenBucket};
    ///
    /// # #[tokio::main(flavor="current_thread", start_paused=true)] async fn main() {
    /// let bucket = TokenBucket::new(10, 1, Interval::HOUR);
    ///
    /// bucket.add_tokens(4);
    /// assert_eq!(bucket.get_tokens_remaining(), 4);
    ///
    /// bucket.add_tokens(100);
    /// assert_eq!(bucket.get_tokens_remaining(), 10);
    /// # }
    /// ```
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self)))]
    pub fn add_tokens(&self, count: u64) {
        let mut state = self.state.lock();
        self.catch_up(&mut state);
        state.content = state.content.saturating_add(count).min(self.capacity);
    }

    /// Drip up until the current time.
    fn catch_up(&self, state: &mut State) {
        let now = self.clock.now();

        if self.drip(state, now) {
            trace!(content = state.content, now, "refilled");
        }
    }

    /// Decide what a pending removal should do next.
    ///
    /// `granted` holds what the parent reported once it has granted the
    /// tokens, and is taken when the removal commits locally.
    fn decide(&self, count: u64, granted: &mut Option<Remaining>) -> Decision<'_, C> {
        if self.is_unlimited() {
            return Decision::Ready(Ok(Remaining::Unlimited));
        }

        if count > self.capacity {
            return Decision::Ready(Err(self.exceeded(count)));
        }

        let mut state = self.state.lock();
        self.catch_up(&mut state);

        if state.content < count {
            let delay = self.wait_for(count - state.content, state.carry);
            trace!(count, content = state.content, ?delay, "waiting for tokens");
            return Decision::Wait(delay);
        }

        let remaining = match (self.parent.as_deref(), granted.take()) {
            (Some(parent), None) => return Decision::Parent(parent),
            (Some(_), Some(upstream)) => {
                state.content -= count;
                upstream.min(Remaining::Tokens(state.content))
            }
            (None, _) => {
                state.content -= count;
                Remaining::Tokens(state.content)
            }
        };

        trace!(count, ?remaining, "removed tokens");
        Decision::Ready(Ok(remaining))
    }
}

enum Decision<'a, C> {
    Ready(Result<Remaining, Error>),
    Wait(Duration),
    Parent(&'a TokenBucket<C>),
}

pin_project! {
    /// The future returned by [`TokenBucket::remove_tokens`].
    pub struct RemoveTokens<'a, C> {
        bucket: &'a TokenBucket<C>,
        count: u64,
        // What the parent reported after granting `count` tokens which have
        // not yet been matched by a local deduction.
        granted: Option<Remaining>,
        #[pin]
        step: Step<'a, C>,
    }

    impl<'a, C> PinnedDrop for RemoveTokens<'a, C> {
        fn drop(this: Pin<&mut Self>) {
            let this = this.project();

            if this.granted.take().is_some() {
                this.bucket.refund_ancestors(*this.count);
            }
        }
    }
}

pin_project! {
    #[project = StepProj]
    enum Step<'a, C> {
        Idle,
        Waiting {
            #[pin]
            sleep: Sleep,
        },
        Parent {
            parent: Pin<Box<RemoveTokens<'a, C>>>,
        },
        Done,
    }
}

impl<'a, C> Future for RemoveTokens<'a, C>
where
    C: Clock,
{
    type Output = Result<Remaining, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();
        let bucket: &'a TokenBucket<C> = *this.bucket;

        loop {
            let from_parent = match this.step.as_mut().project() {
                StepProj::Idle => None,
                StepProj::Waiting { sleep } => {
                    if sleep.poll(cx).is_pending() {
                        return Poll::Pending;
                    }

                    None
                }
                StepProj::Parent { parent } => match parent.as_mut().poll(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(result) => Some(result),
                },
                StepProj::Done => panic!("RemoveTokens polled after completion"),
            };

            match from_parent {
                Some(Ok(remaining)) => {
                    *this.granted = Some(remaining);
                }
                Some(Err(error)) => {
                    this.step.set(Step::Done);
                    return Poll::Ready(Err(error));
                }
                None => {}
            }

            match bucket.decide(*this.count, &mut *this.granted) {
                Decision::Ready(result) => {
                    this.step.set(Step::Done);
                    return Poll::Ready(result);
                }
                Decision::Wait(delay) => {
                    this.step.set(Step::Waiting {
                        sleep: time::sleep(delay),
                    });
                }
                Decision::Parent(parent) => {
                    this.step.set(Step::Parent {
                        parent: Box::pin(parent.remove_tokens(*this.count)),
                    });
                }
            }
        }
    }
}

/// A builder for a [`TokenBucket`].
pub struct Builder<C = TokioClock> {
    /// The max number of tokens, `0` for unlimited.
    capacity: u64,
    /// Tokens to add every `interval`.
    refill: u64,
    /// Interval at which `refill` tokens are added.
    interval: Interval,
    /// The initial count of tokens.
    initial: u64,
    parent: Option<Arc<TokenBucket<C>>>,
    clock: C,
}

impl Default for Builder<TokioClock> {
    fn default() -> Self {
        Self::with_clock(TokioClock::new())
    }
}

impl<C> Builder<C> {
    /// Construct a builder which reads time from the given clock.
    ///
    /// # Examples
    ///
    /// ```
    /// use drip_limiter::{Builder, Interval, ManualClock};
    /// use std::time::Duration;
    ///
    /// let clock = ManualClock::new();
    ///
    /// let bucket = Builder::with_clock(clock.clone())
    ///     .capacity(10)
    ///     .refill(1)
    ///     .interval(Interval::SECOND)
    ///     .build();
    ///
    /// clock.advance(Duration::from_secs(3));
    /// assert_eq!(bucket.get_tokens_remaining(), 3);
    /// ```
    pub fn with_clock(clock: C) -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            refill: DEFAULT_REFILL,
            interval: DEFAULT_INTERVAL,
            initial: 0,
            parent: None,
            clock,
        }
    }

    /// Configure the max number of tokens the bucket holds. The default value
    /// is `0`, which makes the bucket unlimited.
    pub fn capacity(mut self, capacity: u64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Configure the number of tokens added every [`interval`]. The default
    /// value is `1024`.
    ///
    /// A refill of `0` tops the bucket up to capacity whenever it is
    /// inspected.
    ///
    /// [`interval`]: Builder::interval
    pub fn refill(mut self, refill: u64) -> Self {
        self.refill = refill;
        self
    }

    /// Configure the interval at which [`refill`] tokens are added. This is
    /// 1ms by default.
    ///
    /// [`refill`]: Builder::refill
    pub fn interval<I>(mut self, interval: I) -> Self
    where
        I: Into<Interval>,
    {
        self.interval = interval.into();
        self
    }

    /// Configure the interval by its symbolic name, such as `"second"` or
    /// `"day"`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidInterval`] if the name is not recognized.
    ///
    /// # Examples
    ///
    /// ```
    /// use drip_limiter::{Interval, TokenBucket};
    ///
    /// # #[tokio::main(flavor="current_thread", start_paused=true)] async fn main() -> Result<(), drip_limiter::Error> {
    /// let bucket = TokenBucket::builder().named_interval("minute")?.build();
    /// assert_eq!(bucket.interval(), Interval::MINUTE);
    ///
    /// assert!(TokenBucket::builder().named_interval("fortnight").is_err());
    /// # Ok(()) }
    /// ```
    pub fn named_interval(self, name: &str) -> Result<Self, Error> {
        Ok(self.interval(name.parse::<Interval>()?))
    }

    /// Configure the number of tokens the bucket starts with. The default value
    /// is `0`.
    ///
    /// Saturates to the capacity at build time.
    pub fn initial(mut self, initial: u64) -> Self {
        self.initial = initial;
        self
    }

    /// Configure a parent bucket which must also grant every removal.
    pub fn parent(mut self, parent: Arc<TokenBucket<C>>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Construct a new [`TokenBucket`].
    pub fn build(self) -> TokenBucket<C>
    where
        C: Clock,
    {
        let Self {
            capacity,
            refill,
            interval,
            initial,
            parent,
            clock,
        } = self;

        let state = State {
            content: initial.min(capacity),
            last_refill: clock.now(),
            carry: 0,
        };

        TokenBucket {
            capacity,
            refill,
            interval,
            parent,
            clock,
            state: Mutex::new(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Builder;
    use crate::{Interval, ManualClock, TokenBucket};
    use std::sync::Arc;
    use std::time::Duration;

    fn bucket(
        clock: &ManualClock,
        capacity: u64,
        refill: u64,
        millis: u64,
    ) -> TokenBucket<ManualClock> {
        Builder::with_clock(clock.clone())
            .capacity(capacity)
            .refill(refill)
            .interval(Interval::from_millis(millis))
            .build()
    }

    #[test]
    fn full_bucket_drains_to_zero() {
        let clock = ManualClock::new();

        for capacity in [1, 7, 100, 65_536] {
            let bucket = Builder::with_clock(clock.clone())
                .capacity(capacity)
                .refill(1)
                .interval(Interval::SECOND)
                .initial(capacity)
                .build();

            assert!(bucket.try_remove_tokens(capacity));
            assert_eq!(bucket.get_tokens_remaining(), 0);
        }
    }

    #[test]
    fn remaining_is_idempotent() {
        let clock = ManualClock::new();
        let bucket = bucket(&clock, 10, 3, 100);

        clock.advance(Duration::from_millis(150));
        let first = bucket.get_tokens_remaining();
        let second = bucket.get_tokens_remaining();
        assert_eq!(first, 4);
        assert_eq!(first, second);
    }

    #[test]
    fn frequent_drips_do_not_lose_time() {
        let clock = ManualClock::new();
        let bucket = bucket(&clock, 10, 1, 100);

        // Observing the bucket every 30ms must still yield one token per 100ms.
        for _ in 0..10 {
            clock.advance(Duration::from_millis(30));
            bucket.get_tokens_remaining();
        }

        assert_eq!(bucket.get_tokens_remaining(), 3);
    }

    #[test]
    fn uneven_refill_polled_every_millisecond() {
        let clock = ManualClock::new();
        let polled = bucket(&clock, 1000, 3, 100);
        let idle = bucket(&clock, 1000, 3, 100);

        for _ in 0..10_000 {
            clock.advance(Duration::from_millis(1));
            polled.get_tokens_remaining();
        }

        assert_eq!(idle.get_tokens_remaining(), 300);
        assert_eq!(polled.get_tokens_remaining(), 300);
    }

    #[test]
    fn drip_clamps_to_capacity() {
        let clock = ManualClock::new();
        let bucket = bucket(&clock, 5, 1, 10);

        clock.advance(Duration::from_secs(60));
        assert_eq!(bucket.get_tokens_remaining(), 5);

        // After saturating, accounting restarts from the clamp point.
        assert!(bucket.try_remove_tokens(5));
        clock.advance(Duration::from_millis(10));
        assert_eq!(bucket.get_tokens_remaining(), 1);
    }

    #[test]
    fn zero_refill_is_always_full() {
        let clock = ManualClock::new();
        let bucket = bucket(&clock, 8, 0, 1000);

        assert_eq!(bucket.get_tokens_remaining(), 8);
        assert!(bucket.try_remove_tokens(8));
        assert!(bucket.try_remove_tokens(8));
        assert!(!bucket.try_remove_tokens(9));
    }

    #[test]
    fn unlimited_bucket() {
        let clock = ManualClock::new();
        let bucket = bucket(&clock, 0, 1, 1000);

        assert!(bucket.try_remove_tokens(u64::MAX));
        assert_eq!(bucket.get_tokens_remaining(), 0);
    }

    #[test]
    fn clock_regression_stalls_refill() {
        let clock = ManualClock::new();
        clock.set(10_000);
        let bucket = bucket(&clock, 10, 1, 100);

        clock.set(5_000);
        assert_eq!(bucket.get_tokens_remaining(), 0);

        clock.set(5_200);
        assert_eq!(bucket.get_tokens_remaining(), 2);
    }

    #[test]
    fn add_tokens_clamps() {
        let clock = ManualClock::new();
        let bucket = bucket(&clock, 10, 1, 1000);

        bucket.add_tokens(3);
        assert_eq!(bucket.get_tokens_remaining(), 3);
        bucket.add_tokens(u64::MAX);
        assert_eq!(bucket.get_tokens_remaining(), 10);
    }

    #[test]
    fn wait_estimate_rounds_up() {
        let clock = ManualClock::new();
        let bucket = bucket(&clock, 10, 3, 100);

        assert_eq!(bucket.wait_for(1, 0), Duration::from_millis(34));
        assert_eq!(bucket.wait_for(3, 0), Duration::from_millis(100));
        assert_eq!(bucket.wait_for(10, 0), Duration::from_millis(334));

        // Partial replenishment already accrued shortens the wait.
        assert_eq!(bucket.wait_for(1, 50), Duration::from_millis(17));
        assert_eq!(bucket.wait_for(1, 99), Duration::from_millis(1));
    }

    #[test]
    fn wait_estimate_accounts_for_carry() {
        let clock = ManualClock::new();
        let bucket = bucket(&clock, 10, 3, 100);

        clock.advance(Duration::from_millis(50));
        assert_eq!(bucket.get_tokens_remaining(), 1);

        let carry = bucket.state.lock().carry;
        assert_eq!(carry, 50);

        let wait = bucket.wait_for(1, carry);
        clock.advance(wait);
        assert_eq!(bucket.get_tokens_remaining(), 2);
    }

    #[test]
    fn try_remove_checks_local_before_parent() {
        let clock = ManualClock::new();

        let parent = Arc::new(
            Builder::with_clock(clock.clone())
                .capacity(10)
                .refill(1)
                .interval(Interval::HOUR)
                .initial(10)
                .build(),
        );

        let child = Builder::with_clock(clock.clone())
            .capacity(10)
            .refill(1)
            .interval(Interval::HOUR)
            .initial(2)
            .parent(parent.clone())
            .build();

        // Local shortage must not cost the parent anything.
        assert!(!child.try_remove_tokens(5));
        assert_eq!(parent.get_tokens_remaining(), 10);

        assert!(child.try_remove_tokens(2));
        assert_eq!(parent.get_tokens_remaining(), 8);
        assert_eq!(child.get_tokens_remaining(), 0);
    }

    #[test]
    fn try_remove_refused_by_parent() {
        let clock = ManualClock::new();

        let parent = Arc::new(
            Builder::with_clock(clock.clone())
                .capacity(10)
                .refill(1)
                .interval(Interval::HOUR)
                .initial(1)
                .build(),
        );

        let child = Builder::with_clock(clock.clone())
            .capacity(10)
            .refill(1)
            .interval(Interval::HOUR)
            .initial(10)
            .parent(parent.clone())
            .build();

        assert!(!child.try_remove_tokens(3));
        assert_eq!(child.get_tokens_remaining(), 10);
        assert_eq!(parent.get_tokens_remaining(), 1);
    }

    #[test]
    fn debug_reports_content() {
        let clock = ManualClock::new();
        let bucket = Builder::with_clock(clock)
            .capacity(20)
            .refill(10)
            .interval(Interval::from_millis(2000))
            .initial(5)
            .build();

        assert_eq!(
            format!("{:?}", bucket),
            "TokenBucket { content: 5, capacity: 20, refill: 10, interval: Interval { millis: 2000 }, parent: None }"
        );
    }
}
