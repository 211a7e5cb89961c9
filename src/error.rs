use std::time::Duration;

/// Rejected window configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidLimit {
    #[error("max_requests must be greater than zero")]
    ZeroMaxRequests,
    #[error("period must be greater than zero")]
    ZeroPeriod,
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
}

/// The scheduler driving a spawned acquisition could not deliver a result.
///
/// A timed out acquisition is not an error; it resolves to `Ok(false)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AcquireError {
    /// No tokio runtime was available to poll the window.
    #[error("no tokio runtime available to schedule acquisition")]
    NoRuntime,
    /// The task polling the window went away before resolving, e.g. because
    /// its runtime shut down.
    #[error("acquisition task stopped before resolving")]
    SchedulerGone,
}

/// The window is full.
#[derive(Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rate limited; oldest admission leaves the window in {earliest_retry_time:?}")]
pub struct RateLimited {
    pub(crate) earliest_retry_time: Duration,
}

impl RateLimited {
    /// How long until the oldest admission in the window expires.
    ///
    /// Expiry is strict, so a retry exactly at this point may still be
    /// rejected; the slot frees up on the next clock tick after it.
    pub fn earliest_retry_after(&self) -> Duration {
        self.earliest_retry_time
    }
}

impl std::fmt::Debug for RateLimited {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RateLimited(earliest_retry_after={:?})",
            self.earliest_retry_time
        )
    }
}
