#![doc = include_str!("../README.md")]
//!
//! # Core Components
//!
//! - [`SlidingWindow`] - The limiter, with pluggable storage and clock
//! - [`WindowLimit`] - Capacity, window width and polling cadence
//! - [`Clock`] trait and implementations for time sources
//! - Storage implementations for different concurrency needs
//!
//! # Quick Start
//!
//! ```rust
//! use std::time::Duration;
//!
//! use fenestra::{SlidingWindow, WindowLimit};
//!
//! // At most 5 requests in any trailing second
//! let limit = WindowLimit::new(5, Duration::from_secs(1)).unwrap();
//! let window = SlidingWindow::new(limit);
//!
//! if window.try_acquire() {
//!     println!("request admitted");
//! }
//! ```
//!
//! With the `async` feature, [`SlidingWindow::acquire`] waits for a free slot
//! up to a timeout without blocking the calling thread.

mod clock;
mod error;
#[cfg(feature = "async")]
pub mod futures;
mod limit;
mod storage;
mod window;

#[cfg(feature = "tokio")]
pub use clock::TokioClock;
pub use clock::{Clock, ManualClock, StdClock};
#[cfg(feature = "quanta")]
pub use clock::{FastClock, QuantaClock};
pub use error::*;
pub use limit::{DEFAULT_POLL_INTERVAL, WindowLimit};
pub use window::SlidingWindow;

pub use storage::{
    Timestamps, WindowStorage, local::LocalStorage, locked::LockedStorage, shared::SharedStorage,
};
