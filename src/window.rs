use std::time::Duration;

use tracing::{debug, trace};

use crate::error::{InvalidLimit, RateLimited};
use crate::storage::locked::LockedStorage;
use crate::storage::{Admission, WindowStorage};
use crate::{Clock, StdClock, WindowLimit};

/// A sliding-window rate limiter with configurable storage and clock.
///
/// The window remembers the instant of every admission made during the
/// trailing `period`. A request is admitted when fewer than `max_requests`
/// such instants remain after dropping the ones that fell out of the window.
/// Expired instants are evicted lazily, as part of the next admission attempt
/// (or an explicit [`evict_expired`](Self::evict_expired)).
///
/// # Type Parameters
///
/// - `S`: Storage strategy (default: [`LockedStorage`] for concurrent access)
/// - `C`: Clock implementation (default: [`StdClock`])
///
/// # Examples
///
/// ```rust
/// use fenestra::SlidingWindow;
/// use std::time::Duration;
///
/// let window = SlidingWindow::try_new(5, Duration::from_secs(1)).unwrap();
///
/// let admitted: Vec<bool> = (0..7).map(|_| window.try_acquire()).collect();
/// assert_eq!(admitted, [true, true, true, true, true, false, false]);
/// ```
#[derive(Debug, Clone)]
pub struct SlidingWindow<S = LockedStorage, C = StdClock> {
    window: S,
    clock: C,
    limit: WindowLimit,
}

impl SlidingWindow<LockedStorage, StdClock> {
    /// Creates a window with the given limit, using locked storage and the
    /// standard clock.
    pub fn new(limit: WindowLimit) -> Self {
        Self::from_parts(limit, StdClock::default())
    }

    /// Creates a window admitting `max_requests` per trailing `period`.
    ///
    /// # Errors
    ///
    /// Fails if either argument is zero.
    pub fn try_new(max_requests: u32, period: Duration) -> Result<Self, InvalidLimit> {
        Ok(Self::new(WindowLimit::new(max_requests, period)?))
    }
}

impl<C: Clock> SlidingWindow<LockedStorage, C> {
    /// Creates a window with a custom clock implementation.
    ///
    /// Use this when you need a specific timing source, such as
    /// [`ManualClock`](crate::ManualClock) for testing or
    /// [`TokioClock`](crate::TokioClock) under paused tokio time.
    pub fn with_clock(limit: WindowLimit, clock: C) -> Self {
        Self::from_parts(limit, clock)
    }
}

impl<S: WindowStorage, C: Clock> SlidingWindow<S, C> {
    /// Creates a window from custom storage and clock implementations.
    pub fn from_parts(limit: WindowLimit, clock: C) -> Self {
        Self {
            window: S::new(limit.max_requests.get() as usize),
            clock,
            limit,
        }
    }

    /// Attempts to admit one request right now.
    ///
    /// Returns `true` and records the admission if the window has room,
    /// `false` otherwise. Never blocks beyond the storage's critical section.
    pub fn try_acquire(&self) -> bool {
        matches!(self.admit(), Admission::Admitted)
    }

    /// Attempts to admit one request, reporting when to retry on rejection.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fenestra::SlidingWindow;
    /// use std::time::Duration;
    ///
    /// let window = SlidingWindow::try_new(1, Duration::from_secs(10)).unwrap();
    /// assert!(window.try_acquire_or_retry_after().is_ok());
    ///
    /// let rejected = window.try_acquire_or_retry_after().unwrap_err();
    /// assert!(rejected.earliest_retry_after() <= Duration::from_secs(10));
    /// ```
    pub fn try_acquire_or_retry_after(&self) -> Result<(), RateLimited> {
        match self.admit() {
            Admission::Admitted => Ok(()),
            Admission::Rejected { oldest } => {
                let now = self.clock.now();
                Err(RateLimited {
                    earliest_retry_time: oldest
                        .saturating_add(self.limit.period)
                        .saturating_sub(now),
                })
            }
        }
    }

    /// Waits on the current thread until a request is admitted or `timeout`
    /// elapses.
    ///
    /// Re-checks the window every [`poll_interval`](WindowLimit::poll_interval),
    /// sleeping in between. One attempt is always made, so a zero timeout
    /// behaves like [`try_acquire`](Self::try_acquire). Prefer
    /// [`acquire`](Self::acquire) inside async code.
    pub fn acquire_blocking(&self, timeout: Duration) -> bool {
        let deadline = self.clock.now().saturating_add(timeout);
        let mut attempts = 0u32;
        loop {
            attempts = attempts.saturating_add(1);
            if self.try_acquire() {
                debug!(attempts, "admitted after waiting");
                return true;
            }
            if self.clock.now() >= deadline {
                debug!(attempts, ?timeout, "timed out waiting for admission");
                return false;
            }
            std::thread::sleep(self.limit.poll_interval);
        }
    }

    /// Free slots at the current instant.
    ///
    /// Counts expired entries as free without evicting them.
    pub fn available(&self) -> u32 {
        let expiration = self.clock.now().saturating_sub(self.limit.period);
        let live = self.window.with_window(|ts| ts.live(expiration));
        let max = self.limit.max_requests.get() as usize;
        max.saturating_sub(live) as u32
    }

    /// Number of retained admission timestamps, including expired ones that
    /// have not been evicted yet.
    pub fn in_window(&self) -> usize {
        self.window.with_window(|ts| ts.len())
    }

    /// Evicts expired timestamps without attempting an admission.
    ///
    /// Eviction otherwise only happens as part of an admission attempt, so a
    /// window that stops receiving traffic keeps its last entries around.
    /// Returns the number of evicted entries.
    pub fn evict_expired(&self) -> usize {
        let evicted = self.window.with_window(|ts| {
            let expiration = self.clock.now().saturating_sub(self.limit.period);
            ts.evict(expiration)
        });
        if evicted > 0 {
            trace!(evicted, "evicted expired admissions");
        }
        evicted
    }

    /// Returns the limit configuration.
    pub fn limit(&self) -> &WindowLimit {
        &self.limit
    }

    pub(crate) fn now(&self) -> Duration {
        self.clock.now()
    }

    fn admit(&self) -> Admission {
        let max_requests = self.limit.max_requests.get() as usize;
        let period = self.limit.period;
        // read the clock under the lock so insertion order matches time order
        let (admission, in_window) = self.window.with_window(|ts| {
            let admission = ts.admit(self.clock.now(), period, max_requests);
            (admission, ts.len())
        });
        trace!(
            admitted = matches!(admission, Admission::Admitted),
            in_window,
            "admission check"
        );
        admission
    }
}
