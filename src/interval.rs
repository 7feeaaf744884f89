use core::convert::TryFrom;
use core::fmt;
use core::str::FromStr;
use core::time::Duration;

use crate::Error;

/// The period over which a bucket refills, or a limiter counts, its tokens.
///
/// Stored as whole milliseconds. Can be constructed from a [`Duration`], or
/// parsed from one of the symbolic names `sec`/`second`, `min`/`minute`,
/// `hr`/`hour` and `day`.
///
/// # Examples
///
/// ```
/// use drip_limiter::Interval;
/// use std::time::Duration;
///
/// let minute: Interval = "minute".parse()?;
/// assert_eq!(minute, Interval::MINUTE);
/// assert_eq!(minute.as_millis(), 60_000);
///
/// assert_eq!(Interval::from(Duration::from_secs(1)), Interval::SECOND);
/// assert!("fortnight".parse::<Interval>().is_err());
/// # Ok::<_, drip_limiter::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    millis: u64,
}

impl Interval {
    /// One second.
    pub const SECOND: Interval = Interval::from_millis(1000);
    /// One minute.
    pub const MINUTE: Interval = Interval::from_millis(60 * 1000);
    /// One hour.
    pub const HOUR: Interval = Interval::from_millis(60 * 60 * 1000);
    /// One day.
    pub const DAY: Interval = Interval::from_millis(24 * 60 * 60 * 1000);

    /// Construct an interval from a number of milliseconds.
    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// The length of the interval in milliseconds.
    #[inline]
    pub const fn as_millis(self) -> u64 {
        self.millis
    }

    /// The length of the interval as a [`Duration`].
    #[inline]
    pub const fn as_duration(self) -> Duration {
        Duration::from_millis(self.millis)
    }
}

impl From<Duration> for Interval {
    /// Sub-millisecond precision is truncated.
    fn from(duration: Duration) -> Self {
        Self::from_millis(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }
}

impl FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sec" | "second" => Ok(Self::SECOND),
            "min" | "minute" => Ok(Self::MINUTE),
            "hr" | "hour" => Ok(Self::HOUR),
            "day" => Ok(Self::DAY),
            other => Err(Error::InvalidInterval {
                interval: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.millis)
    }
}
