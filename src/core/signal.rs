//! Broadcast wake-up for blocked cursors
//!
//! `std::sync::Condvar` only pairs with a `Mutex`, while stream state sits
//! behind an `RwLock` so cursors can copy concurrently. The signal keeps its
//! own generation counter instead: a waiter samples the generation *before*
//! inspecting stream state, and every mutation bumps it, so a wake-up that
//! lands between the inspection and the wait is never lost.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub(crate) struct Signal {
    generation: Mutex<u64>,
    cond: Condvar,
}

impl Signal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, u64> {
        self.generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Current generation. Sample this before checking the predicate.
    #[inline]
    pub(crate) fn generation(&self) -> u64 {
        *self.lock()
    }

    /// Block until the generation moves past `seen`.
    pub(crate) fn wait_past(&self, seen: u64) {
        let mut current = self.lock();
        while *current == seen {
            current = self
                .cond
                .wait(current)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Wake every waiter; each re-evaluates its own predicate.
    pub(crate) fn broadcast(&self) {
        let mut current = self.lock();
        *current = current.wrapping_add(1);
        self.cond.notify_all();
    }
}
