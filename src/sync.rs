//! Reader-writer lock used by [`RotatingSet`](crate::RotatingSet).
//!
//! Normal builds use `parking_lot::RwLock`, which has no poisoning. Builds
//! with `RUSTFLAGS="--cfg loom"` swap in `loom::sync::RwLock` so the loom
//! model tests can explore every interleaving of readers and writers.
//!
//! ```bash
//! RUSTFLAGS="--cfg loom" cargo test --test rotating_set_loom_tests --release
//! ```

#[cfg(loom)]
use std::sync::PoisonError;

#[cfg(not(loom))]
pub(crate) type ReadGuard<'a, T> = parking_lot::RwLockReadGuard<'a, T>;
#[cfg(not(loom))]
pub(crate) type WriteGuard<'a, T> = parking_lot::RwLockWriteGuard<'a, T>;

#[cfg(loom)]
pub(crate) type ReadGuard<'a, T> = loom::sync::RwLockReadGuard<'a, T>;
#[cfg(loom)]
pub(crate) type WriteGuard<'a, T> = loom::sync::RwLockWriteGuard<'a, T>;

/// Shared/exclusive lock with a single, infallible acquisition API.
pub(crate) struct RwLock<T> {
    #[cfg(not(loom))]
    inner: parking_lot::RwLock<T>,
    #[cfg(loom)]
    inner: loom::sync::RwLock<T>,
}

impl<T> RwLock<T> {
    #[inline]
    pub(crate) fn new(value: T) -> Self {
        Self {
            #[cfg(not(loom))]
            inner: parking_lot::RwLock::new(value),
            #[cfg(loom)]
            inner: loom::sync::RwLock::new(value),
        }
    }

    /// Acquires the lock in shared mode.
    #[cfg(not(loom))]
    #[inline]
    pub(crate) fn read(&self) -> ReadGuard<'_, T> {
        self.inner.read()
    }

    /// Acquires the lock in exclusive mode.
    #[cfg(not(loom))]
    #[inline]
    pub(crate) fn write(&self) -> WriteGuard<'_, T> {
        self.inner.write()
    }

    // A panic while holding the guard cannot leave the deque half-updated,
    // so a poisoned lock is still safe to use.
    #[cfg(loom)]
    pub(crate) fn read(&self) -> ReadGuard<'_, T> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(loom)]
    pub(crate) fn write(&self) -> WriteGuard<'_, T> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
