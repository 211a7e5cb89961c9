use std::sync::Weak;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, trace};

use crate::storage::WindowStorage;
use crate::{Clock, SlidingWindow};

/// Periodically evicts expired admissions from `limiter`.
///
/// Admission attempts evict lazily, so a window that goes quiet holds on to
/// its last `max_requests` timestamps. Spawn this to reclaim them on a
/// schedule. The loop ends on the first tick after the limiter is dropped.
///
/// # Panics
///
/// Panics if `every` is zero.
///
/// # Examples
///
/// ```rust
/// use fenestra::SlidingWindow;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let window = Arc::new(SlidingWindow::try_new(100, Duration::from_secs(1)).unwrap());
/// tokio::spawn(fenestra::futures::sweep(
///     Arc::downgrade(&window),
///     Duration::from_secs(5),
/// ));
/// # }
/// ```
pub async fn sweep<S, C>(limiter: Weak<SlidingWindow<S, C>>, every: Duration)
where
    S: WindowStorage,
    C: Clock,
{
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(window) = limiter.upgrade() else {
            debug!("limiter dropped; stopping sweeper");
            return;
        };
        let evicted = window.evict_expired();
        trace!(evicted, remaining = window.in_window(), "swept window");
    }
}
