use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use std::time::Duration;

use futures::future::FusedFuture;
use pin_project_lite::pin_project;
use tracing::debug;

use super::timer::{Instant, Sleep, sleep};
use crate::storage::WindowStorage;
use crate::{Clock, SlidingWindow};

pin_project! {
    /// Future returned by [`SlidingWindow::acquire`].
    ///
    /// Resolves to `true` once a request is admitted, or `false` once the
    /// deadline passes without admission. The first poll always attempts an
    /// admission, so a zero timeout behaves like
    /// [`try_acquire`](SlidingWindow::try_acquire).
    ///
    /// The outcome is produced once. Polling again after completion returns the
    /// same outcome without touching the window. Dropping the future stops the
    /// retries.
    #[must_use = "futures do nothing unless polled"]
    pub struct Acquire<'a, S, C> {
        limiter: &'a SlidingWindow<S, C>,
        deadline: Duration,
        #[pin]
        delay: Option<Sleep>,
        attempts: u32,
        outcome: Option<bool>,
    }
}

impl<'a, S, C> Acquire<'a, S, C>
where
    S: WindowStorage,
    C: Clock,
{
    pub(crate) fn new(limiter: &'a SlidingWindow<S, C>, timeout: Duration) -> Self {
        Self {
            deadline: limiter.now().saturating_add(timeout),
            limiter,
            delay: None,
            attempts: 0,
            outcome: None,
        }
    }
}

impl<S, C> Future for Acquire<'_, S, C>
where
    S: WindowStorage,
    C: Clock,
{
    type Output = bool;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();
        if let Some(outcome) = *this.outcome {
            return Poll::Ready(outcome);
        }

        loop {
            // are we already waiting for the next attempt?
            if let Some(delay) = this.delay.as_mut().as_pin_mut() {
                ready!(delay.poll(cx));
            }

            *this.attempts = this.attempts.saturating_add(1);
            let outcome = if this.limiter.try_acquire() {
                Some(true)
            } else if this.limiter.now() >= *this.deadline {
                Some(false)
            } else {
                None
            };

            if let Some(outcome) = outcome {
                debug!(admitted = outcome, attempts = *this.attempts, "acquire resolved");
                *this.outcome = Some(outcome);
                this.delay.set(None);
                return Poll::Ready(outcome);
            }

            let interval = this.limiter.limit().poll_interval();
            if let Some(delay) = this.delay.as_mut().as_pin_mut() {
                delay.reset(Instant::now() + interval);
            } else {
                this.delay.set(Some(sleep(interval)));
            }
        }
    }
}

impl<S, C> FusedFuture for Acquire<'_, S, C>
where
    S: WindowStorage,
    C: Clock,
{
    fn is_terminated(&self) -> bool {
        self.outcome.is_some()
    }
}

impl<S: WindowStorage, C: Clock> SlidingWindow<S, C> {
    /// Waits until a request is admitted or `timeout` elapses.
    ///
    /// The deadline is fixed when this method is called. Until then the window
    /// is re-checked every [`poll_interval`](crate::WindowLimit::poll_interval),
    /// suspending on a tokio timer in between. Waiters are not queued: whoever
    /// polls first after a slot frees up takes it.
    ///
    /// Must be polled within a tokio runtime with the time driver enabled.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fenestra::SlidingWindow;
    /// use std::time::Duration;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let window = SlidingWindow::try_new(1, Duration::from_millis(50)).unwrap();
    /// assert!(window.try_acquire());
    /// // the first admission leaves the window after 50ms
    /// assert!(window.acquire(Duration::from_secs(1)).await);
    /// # }
    /// ```
    pub fn acquire(&self, timeout: Duration) -> Acquire<'_, S, C> {
        Acquire::new(self, timeout)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::FutureExt;
    use futures::future::join_all;
    use nonzero_ext::nonzero;

    use crate::clock::{ManualClock, TokioClock};
    use crate::{DEFAULT_POLL_INTERVAL, WindowLimit};

    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_oldest_admission_to_expire() {
        let limit = WindowLimit::per_second(nonzero!(5u32));
        let window = SlidingWindow::with_clock(limit, TokioClock::default());
        let start = tokio::time::Instant::now();

        let admitted: Vec<bool> = (0..7).map(|_| window.try_acquire()).collect();
        assert_eq!(vec![true, true, true, true, true, false, false], admitted);

        assert!(window.acquire(Duration::from_secs(5)).await);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(1), "too early: {elapsed:?}");
        assert!(elapsed <= Duration::from_secs(1) + DEFAULT_POLL_INTERVAL * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_window_stays_full() {
        let limit = WindowLimit::new(1, Duration::from_secs(10)).unwrap();
        let window = SlidingWindow::with_clock(limit, TokioClock::default());
        assert!(window.try_acquire());

        let start = tokio::time::Instant::now();
        assert!(!window.acquire(ms(200)).await);
        let elapsed = start.elapsed();
        assert!(elapsed >= ms(200));
        assert!(elapsed <= ms(200) + DEFAULT_POLL_INTERVAL);
        // a timed out acquisition records nothing
        assert_eq!(1, window.in_window());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_with_free_slot() {
        let limit = WindowLimit::new(1, Duration::from_secs(10)).unwrap();
        let window = SlidingWindow::with_clock(limit, TokioClock::default());
        assert!(window.acquire(Duration::ZERO).await);
        assert_eq!(1, window.in_window());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_on_full_window_does_not_wait() {
        let limit = WindowLimit::new(1, Duration::from_secs(10)).unwrap();
        let window = SlidingWindow::with_clock(limit, TokioClock::default());
        assert!(window.try_acquire());

        let start = tokio::time::Instant::now();
        assert!(!window.acquire(Duration::ZERO).await);
        assert!(start.elapsed() < DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn resolves_on_first_poll_without_runtime_when_possible() {
        // neither path arms a timer, so no tokio runtime is needed
        let clock = Arc::new(ManualClock::default());
        let limit = WindowLimit::new(1, ms(100)).unwrap();
        let window = SlidingWindow::with_clock(limit, Arc::clone(&clock));

        assert_eq!(Some(true), window.acquire(ms(500)).now_or_never());
        assert_eq!(Some(false), window.acquire(Duration::ZERO).now_or_never());
    }

    #[test]
    fn outcome_is_terminal() {
        let clock = Arc::new(ManualClock::default());
        let limit = WindowLimit::new(1, ms(100)).unwrap();
        let window = SlidingWindow::with_clock(limit, Arc::clone(&clock));
        assert!(window.try_acquire());

        let mut acquire = Box::pin(window.acquire(Duration::ZERO));
        assert!(!acquire.is_terminated());
        assert_eq!(Some(false), acquire.as_mut().now_or_never());
        assert!(acquire.is_terminated());

        // a slot frees up, but the resolved future must not claim it
        clock.set(ms(101));
        assert_eq!(Some(false), acquire.as_mut().now_or_never());
        assert_eq!(1, window.in_window());
        assert!(window.try_acquire());
    }

    #[test]
    fn attempt_counter_saturates() {
        let clock = Arc::new(ManualClock::default());
        let limit = WindowLimit::new(1, ms(100)).unwrap();
        let window = SlidingWindow::with_clock(limit, Arc::clone(&clock));

        let mut acquire = window.acquire(Duration::ZERO);
        acquire.attempts = u32::MAX;
        let mut acquire = Box::pin(acquire);
        assert_eq!(Some(true), acquire.as_mut().now_or_never());
        assert_eq!(u32::MAX, acquire.attempts);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_poll_interval_bounds_detection_delay() {
        let limit = WindowLimit::new(1, ms(100))
            .unwrap()
            .with_poll_interval(ms(40))
            .unwrap();
        let window = SlidingWindow::with_clock(limit, TokioClock::default());
        assert!(window.try_acquire());

        let start = tokio::time::Instant::now();
        assert!(window.acquire(Duration::from_secs(1)).await);
        // attempts at 0, 40, 80, 120ms; the slot frees up just after 100ms
        let elapsed = start.elapsed();
        assert!(elapsed > ms(100), "too early: {elapsed:?}");
        assert!(elapsed <= ms(140), "too late: {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_waiters_never_exceed_capacity() {
        let limit = WindowLimit::new(2, ms(100)).unwrap();
        let window = SlidingWindow::with_clock(limit, TokioClock::default());
        assert!(window.try_acquire());
        assert!(window.try_acquire());

        // six waiters, each willing to wait just over one period
        let outcomes = join_all((0..6).map(|_| window.acquire(ms(150)))).await;
        assert_eq!(2, outcomes.iter().filter(|&&admitted| admitted).count());
        assert_eq!(2, window.in_window());
    }
}
