use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::timer::sleep;
use crate::storage::WindowStorage;
use crate::{AcquireError, Clock, SlidingWindow};

/// Write side of a one-shot acquisition result. Only the first resolution is
/// delivered; later ones are ignored.
pub(crate) struct Resolver {
    tx: Option<oneshot::Sender<bool>>,
}

impl Resolver {
    pub(crate) fn new() -> (Self, oneshot::Receiver<bool>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// Delivers `outcome` unless a result was already delivered or the
    /// receiving side is gone. Returns whether this call delivered it.
    pub(crate) fn resolve(&mut self, outcome: bool) -> bool {
        match self.tx.take() {
            Some(tx) => tx.send(outcome).is_ok(),
            None => false,
        }
    }

    /// Either resolved already or nobody is waiting for the result.
    pub(crate) fn is_settled(&self) -> bool {
        self.tx.as_ref().is_none_or(|tx| tx.is_closed())
    }
}

/// Result of [`SlidingWindow::spawn_acquire`].
///
/// Resolves to `Ok(true)` once admitted and `Ok(false)` on timeout. An
/// `Err` means the background task could not finish, which is distinct from a
/// timeout. Dropping the handle makes the task stop before its next attempt.
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct AcquireHandle {
    rx: oneshot::Receiver<bool>,
}

impl Future for AcquireHandle {
    type Output = Result<bool, AcquireError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|result| {
            result.map_err(|_| {
                warn!("acquisition task went away without resolving");
                AcquireError::SchedulerGone
            })
        })
    }
}

impl<S, C> SlidingWindow<S, C>
where
    S: WindowStorage + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Waits for admission on a background tokio task.
    ///
    /// Behaves like [`acquire`](Self::acquire), but the retries run on the
    /// current tokio runtime instead of inside the caller's future, so the
    /// caller may hand the handle elsewhere or stop waiting at any time.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::NoRuntime`] when called outside a tokio runtime.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fenestra::SlidingWindow;
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let window = Arc::new(SlidingWindow::try_new(1, Duration::from_millis(20))?);
    /// assert!(window.try_acquire());
    ///
    /// let handle = window.spawn_acquire(Duration::from_secs(1))?;
    /// assert!(handle.await?);
    /// # Ok(())
    /// # }
    /// ```
    pub fn spawn_acquire(self: &Arc<Self>, timeout: Duration) -> Result<AcquireHandle, AcquireError> {
        let runtime = Handle::try_current().map_err(|_| AcquireError::NoRuntime)?;
        let deadline = self.now().saturating_add(timeout);
        let (mut resolver, rx) = Resolver::new();
        let limiter = Arc::clone(self);

        runtime.spawn(async move {
            let interval = limiter.limit().poll_interval();
            let mut attempts = 0u32;
            loop {
                if resolver.is_settled() {
                    debug!(attempts, "acquisition abandoned");
                    return;
                }
                attempts = attempts.saturating_add(1);
                if limiter.try_acquire() {
                    resolver.resolve(true);
                    debug!(attempts, "acquisition admitted");
                    return;
                }
                if limiter.now() >= deadline {
                    resolver.resolve(false);
                    debug!(attempts, ?timeout, "acquisition timed out");
                    return;
                }
                sleep(interval).await;
            }
        });

        Ok(AcquireHandle { rx })
    }
}
