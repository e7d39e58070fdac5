//! Append-only arenas for elements allocated after model construction.
//!
//! Vocabulary annotations, their expressions and property values are only
//! materialized when someone asks for them. They are appended here and never
//! removed, so an index handed out stays valid for the model's lifetime.

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockWriteGuard};

pub(crate) struct Arena<T> {
    items: RwLock<Vec<Arc<T>>>,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }

    /// Panics on an index this arena never handed out.
    pub fn get(&self, index: usize) -> Arc<T> {
        Arc::clone(&self.items.read()[index])
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Everything allocated so far, in allocation order.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.items.read().clone()
    }

    /// Exclusive access for a batch allocation. Ids of the batch start at the
    /// current length.
    pub fn write(&self) -> ArenaWriter<'_, T> {
        ArenaWriter {
            items: self.items.write(),
        }
    }
}

pub(crate) struct ArenaWriter<'a, T> {
    items: RwLockWriteGuard<'a, Vec<Arc<T>>>,
}

impl<T> ArenaWriter<'_, T> {
    /// Index the next pushed item receives.
    pub fn next_index(&self) -> usize {
        self.items.len()
    }

    pub fn extend(&mut self, batch: Vec<T>) {
        self.items.extend(batch.into_iter().map(Arc::new));
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena").field("len", &self.len()).finish()
    }
}
