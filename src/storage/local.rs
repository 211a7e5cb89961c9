use std::cell::RefCell;

use super::{Timestamps, WindowStorage};

/// Non thread-safe implementation of [`WindowStorage`]. This is intended for
/// single threaded scenarios and uses [`RefCell`] internally.
#[derive(Debug)]
pub struct LocalStorage(RefCell<Timestamps>);

impl WindowStorage for LocalStorage {
    fn new(capacity: usize) -> Self {
        Self(RefCell::new(Timestamps::with_capacity(capacity)))
    }

    fn with_window<R>(&self, f: impl FnOnce(&mut Timestamps) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }
}
