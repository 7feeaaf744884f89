#![deny(missing_docs)]
//! Async token buckets for [Tokio], with optional parent chains and a
//! fixed-window rate limiter layered on top.
//!
//! A [`TokenBucket`] holds up to `capacity` tokens and replenishes `refill`
//! tokens every `interval`. Removing tokens either succeeds right away, or
//! suspends the calling task until enough tokens have dripped back into the
//! bucket. After every wake the state of the bucket is checked again, since
//! other tasks may have drained it in the meantime.
//!
//! Buckets can be chained. A bucket with a parent only grants tokens once the
//! parent has granted them too, which lets a number of per-caller buckets
//! share a single global quota.
//!
//! A [`RateLimiter`] counts tokens in fixed windows. Once the budget of the
//! current window is spent, callers either wait for the next window or, if the
//! limiter is configured to [fire immediately], are rejected without waiting.
//!
//! Since this crate uses timing facilities from tokio it has to be used within
//! a Tokio runtime with the [`time` feature] enabled.
//!
//! <br>
//!
//! ## Usage
//!
//! ```
//! use drip_limiter::{Interval, Remaining, TokenBucket};
//!
//! # #[tokio::main(flavor="current_thread", start_paused=true)] async fn main() -> Result<(), drip_limiter::Error> {
//! // Ten tokens at most, one new token every 100 milliseconds.
//! let bucket = TokenBucket::new(10, 1, Interval::from_millis(100));
//!
//! // The bucket starts out empty, so this waits for about a second.
//! let remaining = bucket.remove_tokens(10).await?;
//! assert_eq!(remaining, Remaining::Tokens(0));
//! # Ok(()) }
//! ```
//!
//! <br>
//!
//! ## Hierarchies
//!
//! ```
//! use std::sync::Arc;
//! use drip_limiter::{Interval, TokenBucket};
//!
//! # #[tokio::main(flavor="current_thread", start_paused=true)] async fn main() -> Result<(), drip_limiter::Error> {
//! let global = Arc::new(TokenBucket::new(10, 10, Interval::from_millis(100)));
//!
//! let per_user = TokenBucket::builder()
//!     .capacity(20)
//!     .refill(10)
//!     .interval(Interval::SECOND)
//!     .parent(global.clone())
//!     .build();
//!
//! per_user.remove_tokens(10).await?;
//! assert_eq!(global.get_tokens_remaining(), 0);
//!
//! // The global bucket can never hold 15 tokens.
//! assert!(per_user.remove_tokens(15).await.is_err());
//! # Ok(()) }
//! ```
//!
//! <br>
//!
//! ## Fixed windows
//!
//! ```
//! use drip_limiter::{Grant, Interval, RateLimiter};
//!
//! # #[tokio::main(flavor="current_thread", start_paused=true)] async fn main() -> Result<(), drip_limiter::Error> {
//! let limiter = RateLimiter::builder()
//!     .tokens_per_interval(10)
//!     .interval(Interval::SECOND)
//!     .fire_immediately(true)
//!     .build();
//!
//! assert!(limiter.remove_tokens(10).await?.is_granted());
//! assert_eq!(limiter.remove_tokens(1).await?, Grant::Rejected);
//! # Ok(()) }
//! ```
//!
//! <br>
//!
//! ## Logging
//!
//! With the `tracing` feature enabled, the crate emits `trace` level events
//! through [tracing] whenever a caller has to wait, is granted tokens, or a
//! window rolls over.
//!
//! [Tokio]: https://docs.rs/tokio
//! [tracing]: https://docs.rs/tracing
//! [fire immediately]: https://docs.rs/drip-limiter/0/drip_limiter/struct.LimiterBuilder.html#method.fire_immediately
//! [`time` feature]: https://docs.rs/tokio/1/tokio/#feature-flags

#[cfg(feature = "tracing")]
#[macro_use]
mod tracing_macros {
    macro_rules! trace {
        ($($arg:tt)*) => {
            tracing::trace!($($arg)*)
        };
    }
}

#[cfg(not(feature = "tracing"))]
#[macro_use]
mod tracing_macros {
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }
}

mod clock;
mod interval;
mod rate_limiter;
mod token_bucket;

pub use self::clock::{Clock, ManualClock, TokioClock};
pub use self::interval::Interval;
pub use self::rate_limiter::{LimiterBuilder, RateLimiter};
pub use self::token_bucket::{Builder, RemoveTokens, TokenBucket};

use thiserror::Error;

/// Error type for buckets and limiters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// A symbolic interval name was not recognized.
    #[error("Invalid interval `{interval}`")]
    InvalidInterval {
        /// The name which failed to parse.
        interval: String,
    },
    /// More tokens were requested than could ever be granted at once.
    #[error("Requested tokens {requested} exceeds maximum of {capacity}")]
    CapacityExceeded {
        /// The number of tokens requested.
        requested: u64,
        /// The most tokens that can be granted in a single request.
        capacity: u64,
    },
}

/// The number of tokens left after a successful removal.
///
/// `Unlimited` sorts after every `Tokens` value, so the minimum over a bucket
/// chain is the most constrained bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Remaining {
    /// The bucket which granted the request has this many tokens left.
    Tokens(u64),
    /// The bucket has no capacity limit.
    Unlimited,
}

impl Remaining {
    /// The remaining tokens, or `None` if unlimited.
    pub fn tokens(self) -> Option<u64> {
        match self {
            Remaining::Tokens(tokens) => Some(tokens),
            Remaining::Unlimited => None,
        }
    }
}

/// The outcome of [`RateLimiter::remove_tokens`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grant {
    /// Tokens were removed.
    Granted(Remaining),
    /// The window budget was exhausted and the limiter fires immediately.
    Rejected,
}

impl Grant {
    /// Test if tokens were granted.
    pub fn is_granted(&self) -> bool {
        matches!(self, Grant::Granted(..))
    }
}
