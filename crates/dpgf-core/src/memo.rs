//! Derived values cached by snapshot identity
//!
//! Fetched documents are held as `Arc` snapshots and replaced wholesale on
//! refetch. A `Memo` recomputes its value only when it is asked about a
//! different snapshot than last time; asking again about the same `Arc`
//! returns the cached value.

use std::sync::{Arc, Weak};

pub struct Memo<S, T> {
    // Weak keeps the allocation (and so its address) reserved without
    // keeping the snapshot itself alive.
    source: Weak<S>,
    value: Option<T>,
    computations: usize,
}

impl<S, T> Default for Memo<S, T> {
    fn default() -> Self {
        Self {
            source: Weak::new(),
            value: None,
            computations: 0,
        }
    }
}

impl<S, T> Memo<S, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `snapshot`, computing it with `derive` if the
    /// snapshot differs from the previous call
    pub fn get_or_compute<F>(&mut self, snapshot: &Arc<S>, derive: F) -> &T
    where
        F: FnOnce(&S) -> T,
    {
        let fresh = self.value.is_some() && Weak::ptr_eq(&self.source, &Arc::downgrade(snapshot));
        if !fresh {
            self.source = Arc::downgrade(snapshot);
            self.computations += 1;
            self.value = None;
        }
        self.value.get_or_insert_with(|| derive(&**snapshot))
    }

    /// Number of times the value was (re)computed
    pub fn computations(&self) -> usize {
        self.computations
    }

    pub fn clear(&mut self) {
        self.source = Weak::new();
        self.value = None;
    }
}
