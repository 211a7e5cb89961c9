use std::sync::{Arc, Mutex, PoisonError};

use super::{Timestamps, WindowStorage};

/// Shared mutex-guarded implementation of [`WindowStorage`].
///
/// Clones refer to the same window, so cloned limiters count against one
/// capacity.
#[derive(Debug, Clone)]
pub struct SharedStorage(Arc<Mutex<Timestamps>>);

impl WindowStorage for SharedStorage {
    fn new(capacity: usize) -> Self {
        Self(Arc::new(Mutex::new(Timestamps::with_capacity(capacity))))
    }

    fn with_window<R>(&self, f: impl FnOnce(&mut Timestamps) -> R) -> R {
        let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}
