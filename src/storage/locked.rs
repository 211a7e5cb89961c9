use std::sync::{Mutex, PoisonError};

use super::{Timestamps, WindowStorage};

/// Mutex-guarded implementation of [`WindowStorage`].
///
/// The whole evict-then-admit step runs under one lock, so concurrent callers
/// can never both claim the last free slot.
#[derive(Debug)]
pub struct LockedStorage(Mutex<Timestamps>);

impl WindowStorage for LockedStorage {
    fn new(capacity: usize) -> Self {
        Self(Mutex::new(Timestamps::with_capacity(capacity)))
    }

    fn with_window<R>(&self, f: impl FnOnce(&mut Timestamps) -> R) -> R {
        // the window is never left half-updated, so a poisoned lock is still usable
        let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}
