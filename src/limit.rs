use std::num::NonZeroU32;
use std::time::Duration;

use crate::InvalidLimit;

/// Delay between admission attempts while waiting in
/// [`acquire`](crate::SlidingWindow::acquire).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

const SECOND: Duration = Duration::from_secs(1);
const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

/// Capacity and width of a sliding window.
///
/// At most `max_requests` admissions are allowed within any trailing `period`.
/// The poll interval sets how often a waiting acquisition re-checks the window.
///
/// # Examples
///
/// ```rust
/// use fenestra::WindowLimit;
/// use std::num::NonZeroU32;
/// use std::time::Duration;
///
/// // 5 requests in any trailing second
/// let limit = WindowLimit::new(5, Duration::from_secs(1)).unwrap();
///
/// // 60 requests per minute, re-checking every 50ms while waiting
/// let limit = WindowLimit::per_minute(NonZeroU32::new(60).unwrap())
///     .with_poll_interval(Duration::from_millis(50))
///     .unwrap();
///
/// assert!(WindowLimit::new(0, Duration::from_secs(1)).is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct WindowLimit {
    pub(crate) max_requests: NonZeroU32,
    pub(crate) period: Duration,
    pub(crate) poll_interval: Duration,
}

impl std::fmt::Debug for WindowLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "WindowLimit(max_requests={}, period={:?}, poll_interval={:?})",
            self.max_requests, self.period, self.poll_interval
        )
    }
}

impl WindowLimit {
    /// Creates a limit of `max_requests` admissions per trailing `period`.
    ///
    /// # Errors
    ///
    /// Fails if either `max_requests` or `period` is zero.
    pub fn new(max_requests: u32, period: Duration) -> Result<Self, InvalidLimit> {
        let max_requests = NonZeroU32::new(max_requests).ok_or(InvalidLimit::ZeroMaxRequests)?;
        Self::with_period(max_requests, period)
    }

    /// Creates a limit of `max_requests` admissions per trailing `period`.
    ///
    /// # Errors
    ///
    /// Fails if `period` is zero.
    pub fn with_period(max_requests: NonZeroU32, period: Duration) -> Result<Self, InvalidLimit> {
        if period.is_zero() {
            return Err(InvalidLimit::ZeroPeriod);
        }
        Ok(Self::from_parts(max_requests, period))
    }

    /// `max_requests` admissions in any trailing second.
    ///
    /// ```rust
    /// use fenestra::WindowLimit;
    /// use std::num::NonZeroU32;
    /// use std::time::Duration;
    ///
    /// let limit = WindowLimit::per_second(NonZeroU32::new(100).unwrap());
    /// assert_eq!(limit.max_requests().get(), 100);
    /// assert_eq!(limit.period(), Duration::from_secs(1));
    /// ```
    pub const fn per_second(max_requests: NonZeroU32) -> Self {
        Self::from_parts(max_requests, SECOND)
    }

    /// `max_requests` admissions in any trailing minute.
    pub const fn per_minute(max_requests: NonZeroU32) -> Self {
        Self::from_parts(max_requests, MINUTE)
    }

    /// `max_requests` admissions in any trailing hour.
    pub const fn per_hour(max_requests: NonZeroU32) -> Self {
        Self::from_parts(max_requests, HOUR)
    }

    /// Sets how often a waiting acquisition re-checks the window.
    ///
    /// Shorter intervals notice a freed slot sooner at the cost of more
    /// wakeups. The interval is fixed and does not adapt to contention.
    ///
    /// # Errors
    ///
    /// Fails on a zero interval, which would turn waiting into spinning.
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Result<Self, InvalidLimit> {
        if poll_interval.is_zero() {
            return Err(InvalidLimit::ZeroPollInterval);
        }
        self.poll_interval = poll_interval;
        Ok(self)
    }

    /// Capacity of the window.
    pub const fn max_requests(&self) -> NonZeroU32 {
        self.max_requests
    }

    /// Width of the window.
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Delay between admission attempts while waiting.
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    const fn from_parts(max_requests: NonZeroU32, period: Duration) -> Self {
        Self {
            max_requests,
            period,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
