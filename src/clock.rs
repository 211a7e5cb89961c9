use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Trait for monotonic clock implementations used by the sliding window.
///
/// Admission timestamps are recorded as the elapsed time since the clock's
/// origin, so implementations only need to provide a monotonic offset.
pub trait Clock {
    /// Returns the time elapsed since this clock's origin.
    ///
    /// The returned value must never decrease between calls.
    fn now(&self) -> Duration;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

/// Standard clock implementation using [`std::time::Instant`].
///
/// # Examples
///
/// ```rust
/// use fenestra::{SlidingWindow, StdClock, WindowLimit};
/// use std::num::NonZeroU32;
///
/// let limit = WindowLimit::per_second(NonZeroU32::new(100).unwrap());
/// let window = SlidingWindow::with_clock(limit, StdClock::default());
/// assert!(window.try_acquire());
/// ```
#[derive(Clone, Debug)]
pub struct StdClock {
    origin: std::time::Instant,
}

impl Default for StdClock {
    fn default() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

impl Clock for StdClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// High-precision clock implementation using the `quanta` crate.
///
/// Requires the "quanta" feature to be enabled.
#[cfg(feature = "quanta")]
#[derive(Clone)]
pub struct QuantaClock {
    clock: quanta::Clock,
    origin: quanta::Instant,
}

#[cfg(feature = "quanta")]
impl Default for QuantaClock {
    fn default() -> Self {
        Self::new(quanta::Clock::new())
    }
}

#[cfg(feature = "quanta")]
impl QuantaClock {
    /// Creates a new `QuantaClock` anchored at the current instant of `clock`.
    pub fn new(clock: quanta::Clock) -> Self {
        let origin = clock.now();
        Self { clock, origin }
    }
}

#[cfg(feature = "quanta")]
impl Clock for QuantaClock {
    fn now(&self) -> Duration {
        self.clock.now() - self.origin
    }
}

/// Tokio-compatible clock implementation using [`tokio::time::Instant`].
///
/// Follows tokio's paused time, which makes it the clock of choice when
/// driving [`acquire`](crate::SlidingWindow::acquire) from tests with
/// `#[tokio::test(start_paused = true)]`. Requires the "tokio" feature.
///
/// # Examples
///
/// ```rust
/// # #[cfg(feature = "tokio")]
/// # {
/// use fenestra::{SlidingWindow, TokioClock, WindowLimit};
/// use std::num::NonZeroU32;
///
/// let limit = WindowLimit::per_second(NonZeroU32::new(100).unwrap());
/// let window = SlidingWindow::with_clock(limit, TokioClock::default());
/// # }
/// ```
#[cfg(feature = "tokio")]
#[derive(Clone, Debug)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

#[cfg(feature = "tokio")]
impl Default for TokioClock {
    fn default() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

#[cfg(feature = "tokio")]
impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// High-performance clock using quanta's coarse timing.
///
/// Trades precision for speed: the observed time only moves as often as
/// quanta's upkeep thread refreshes it. Since the window compares timestamps
/// against `now - period`, the refresh interval should be well below the
/// window period. Requires the "quanta" feature to be enabled.
#[cfg(feature = "quanta")]
#[derive(Clone)]
pub struct FastClock {
    clock: quanta::Clock,
    origin: quanta::Instant,
}

#[cfg(feature = "quanta")]
impl Default for FastClock {
    fn default() -> Self {
        Self::new(quanta::Clock::new())
    }
}

#[cfg(feature = "quanta")]
impl FastClock {
    /// Creates a new `FastClock` from a `quanta::Clock` instance.
    ///
    /// **Important**: Ensure the clock's upkeep thread is running, otherwise
    /// the window never observes time passing and stays saturated.
    pub fn new(clock: quanta::Clock) -> Self {
        let origin = clock.recent();
        Self { clock, origin }
    }
}

#[cfg(feature = "quanta")]
impl Clock for FastClock {
    fn now(&self) -> Duration {
        self.clock.recent() - self.origin
    }
}

/// Manual clock for tests and simulations.
///
/// Time only moves when [`set`](Self::set) or [`advance`](Self::advance) is
/// called. Share it with the limiter through `Arc` or a reference.
///
/// # Examples
///
/// ```rust
/// use fenestra::{ManualClock, SlidingWindow, WindowLimit};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let limit = WindowLimit::new(1, Duration::from_millis(100)).unwrap();
/// let clock = Arc::new(ManualClock::default());
/// let window = SlidingWindow::with_clock(limit, Arc::clone(&clock));
///
/// assert!(window.try_acquire());
/// assert!(!window.try_acquire());
///
/// clock.advance(Duration::from_millis(101));
/// assert!(window.try_acquire());
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    /// Creates a new manual clock reading `now`.
    pub fn new(now: Duration) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Sets the current reading.
    pub fn set(&self, now: Duration) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    /// Moves the current reading forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = guard.saturating_add(delta);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
