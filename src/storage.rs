pub mod local;
pub mod locked;
pub mod shared;

use std::collections::VecDeque;
use std::collections::vec_deque;
use std::time::Duration;

use likely_stable::likely;

/// Storage policy abstraction used by [`SlidingWindow`](crate::SlidingWindow).
///
/// Implementations decide how access to the [`Timestamps`] is serialized. The
/// closure passed to [`with_window`](Self::with_window) must run with exclusive
/// access so that eviction and the admission decision happen as one step.
pub trait WindowStorage {
    /// Create empty storage for a window of `capacity` timestamps.
    ///
    /// Only a bounded prefix of `capacity` is reserved up front; the rest is
    /// allocated as admissions arrive.
    fn new(capacity: usize) -> Self;
    /// Run `f` with exclusive access to the window.
    fn with_window<R>(&self, f: impl FnOnce(&mut Timestamps) -> R) -> R;
}

/// Largest number of timestamps reserved before the first admission.
const MAX_PREALLOCATED: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Admitted,
    /// The window is full; `oldest` is the earliest retained timestamp.
    Rejected { oldest: Duration },
}

/// Admission instants within the window, oldest first.
///
/// Entries are only appended at the back and trimmed from the front, so the
/// sequence stays sorted as long as the clock is monotonic.
#[derive(Debug, Clone, Default)]
pub struct Timestamps {
    inner: VecDeque<Duration>,
}

impl Timestamps {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: VecDeque::with_capacity(capacity.min(MAX_PREALLOCATED)),
        }
    }

    /// Number of retained timestamps, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Earliest retained admission.
    pub fn oldest(&self) -> Option<Duration> {
        self.inner.front().copied()
    }

    /// Latest retained admission.
    pub fn newest(&self) -> Option<Duration> {
        self.inner.back().copied()
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, Duration> {
        self.inner.iter()
    }

    /// Drop every entry strictly older than `expiration` and return how many
    /// were dropped.
    pub(crate) fn evict(&mut self, expiration: Duration) -> usize {
        let mut evicted = 0;
        while let Some(&oldest) = self.inner.front() {
            if oldest >= expiration {
                break;
            }
            self.inner.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Entries that would survive eviction at `expiration`.
    pub(crate) fn live(&self, expiration: Duration) -> usize {
        let expired = self.inner.partition_point(|&ts| ts < expiration);
        self.inner.len() - expired
    }

    /// Evict everything older than `now - period`, then record `now` if fewer
    /// than `max_requests` entries remain.
    pub(crate) fn admit(&mut self, now: Duration, period: Duration, max_requests: usize) -> Admission {
        // a clock stepping backwards must not break the ordering
        let now = self.newest().map_or(now, |newest| now.max(newest));
        self.evict(now.saturating_sub(period));
        if likely(self.inner.len() < max_requests) {
            self.inner.push_back(now);
            Admission::Admitted
        } else {
            match self.oldest() {
                Some(oldest) => Admission::Rejected { oldest },
                // only reachable with a zero capacity, which WindowLimit rejects
                None => Admission::Rejected { oldest: now },
            }
        }
    }
}

impl<'a> IntoIterator for &'a Timestamps {
    type Item = &'a Duration;
    type IntoIter = vec_deque::Iter<'a, Duration>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn admits_up_to_capacity() {
        let mut ts = Timestamps::default();
        for _ in 0..3 {
            assert_eq!(Admission::Admitted, ts.admit(ms(0), ms(100), 3));
        }
        assert_eq!(
            Admission::Rejected { oldest: ms(0) },
            ts.admit(ms(10), ms(100), 3)
        );
        assert_eq!(3, ts.len());
    }

    #[test]
    fn eviction_is_strict() {
        let mut ts = Timestamps::default();
        assert_eq!(Admission::Admitted, ts.admit(ms(0), ms(100), 1));
        // exactly one period later the entry is still inside the window
        assert!(matches!(ts.admit(ms(100), ms(100), 1), Admission::Rejected { .. }));
        assert_eq!(Admission::Admitted, ts.admit(ms(101), ms(100), 1));
        assert_eq!(Some(ms(101)), ts.oldest());
    }

    #[test]
    fn evicts_only_the_expired_prefix() {
        let mut ts = Timestamps::default();
        for at in [0, 10, 20, 30, 40] {
            ts.admit(ms(at), ms(1000), 10);
        }
        assert_eq!(3, ts.live(ms(20)));
        assert_eq!(2, ts.evict(ms(20)));
        assert_eq!(vec![ms(20), ms(30), ms(40)], ts.iter().copied().collect::<Vec<_>>());
        assert_eq!(0, ts.evict(ms(5)));
    }

    #[test]
    fn stays_sorted_when_clock_steps_back() {
        let mut ts = Timestamps::default();
        ts.admit(ms(50), ms(1000), 10);
        ts.admit(ms(40), ms(1000), 10);
        ts.admit(ms(60), ms(1000), 10);
        let recorded: Vec<_> = ts.iter().copied().collect();
        assert_eq!(vec![ms(50), ms(50), ms(60)], recorded);
    }

    #[test]
    fn preallocation_is_bounded() {
        let mut ts = Timestamps::with_capacity(usize::MAX);
        assert!(ts.inner.capacity() < 2 * MAX_PREALLOCATED);
        assert_eq!(Admission::Admitted, ts.admit(ms(0), ms(100), usize::MAX));
        assert_eq!(1, ts.len());
    }

    #[test]
    fn period_longer_than_uptime() {
        let mut ts = Timestamps::default();
        assert_eq!(Admission::Admitted, ts.admit(ms(5), Duration::from_secs(60), 1));
        assert!(matches!(ts.admit(ms(6), Duration::from_secs(60), 1), Admission::Rejected { .. }));
    }
}
