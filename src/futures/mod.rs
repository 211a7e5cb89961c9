//! Asynchronous acquisition on top of [`SlidingWindow`](crate::SlidingWindow).
//!
//! Waiting is done by re-checking the window on a fixed cadence, sleeping on a
//! tokio timer in between, so a waiter never occupies a thread.

mod acquire;
mod handle;
mod sweep;
mod timer;

pub use acquire::Acquire;
pub use handle::AcquireHandle;
pub use sweep::sweep;
