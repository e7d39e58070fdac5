//! Write-once memoization cells.
//!
//! Every lazily computed property of a semantic element lives in one
//! [`Cache`]. A cell moves `Unset → InProgress → Done` exactly once; the
//! compute function runs at most once, and a computed value that happens to
//! be empty (`None`, an empty list) is still `Done` and is never recomputed.
//!
//! ## Reentrancy and threads
//!
//! Resolution walks mutually-referential declarations, so one cell's compute
//! function freely reads *other* cells. Reading the *same* cell again from
//! inside its own computation is a cycle: the caller's fallback value is
//! returned (and not stored) instead of recursing forever.
//!
//! A different thread that finds a cell `InProgress` blocks until the owner
//! finishes. Once a model has been traversed, every cell is `Done` and reads
//! only take an uncontended lock.

use std::fmt;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};

enum CacheState<T> {
    Unset,
    InProgress(ThreadId),
    Done(T),
}

pub struct Cache<T> {
    state: Mutex<CacheState<T>>,
    ready: Condvar,
}

impl<T> Default for Cache<T> {
    fn default() -> Self {
        Self {
            state: Mutex::new(CacheState::Unset),
            ready: Condvar::new(),
        }
    }
}

impl<T: Clone> Cache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value, computing it on first access.
    ///
    /// `on_cycle` supplies the value seen by a reentrant read of this cell
    /// while `compute` is still running on the same thread.
    pub fn get_value(&self, compute: impl FnOnce() -> T, on_cycle: impl FnOnce() -> T) -> T {
        let me = thread::current().id();
        let mut state = self.state.lock();
        loop {
            match &*state {
                CacheState::Done(value) => return value.clone(),
                CacheState::InProgress(owner) if *owner == me => {
                    drop(state);
                    tracing::warn!("[CACHE] reentrant read of a cell under computation");
                    return on_cycle();
                }
                CacheState::InProgress(_) => self.ready.wait(&mut state),
                CacheState::Unset => break,
            }
        }
        *state = CacheState::InProgress(me);
        drop(state);

        let mut guard = UnwindGuard { cache: self, armed: true };
        let value = compute();
        guard.armed = false;

        *self.state.lock() = CacheState::Done(value.clone());
        self.ready.notify_all();
        value
    }

    /// The value, if already computed.
    pub fn peek(&self) -> Option<T> {
        match &*self.state.lock() {
            CacheState::Done(value) => Some(value.clone()),
            _ => None,
        }
    }
}

impl<T> Cache<T> {
    pub fn is_computed(&self) -> bool {
        matches!(*self.state.lock(), CacheState::Done(_))
    }
}

/// Puts a cell back to `Unset` if its compute function panics, so waiting
/// threads are released.
struct UnwindGuard<'a, T> {
    cache: &'a Cache<T>,
    armed: bool,
}

impl<T> Drop for UnwindGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            *self.cache.state.lock() = CacheState::Unset;
            self.cache.ready.notify_all();
        }
    }
}

impl<T> fmt::Debug for Cache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match *self.state.lock() {
            CacheState::Unset => "Unset",
            CacheState::InProgress(_) => "InProgress",
            CacheState::Done(_) => "Done",
        };
        f.debug_tuple("Cache").field(&state).finish()
    }
}
