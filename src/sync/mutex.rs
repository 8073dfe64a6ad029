//! Recursive mutual exclusion for threads of one process.
//!
//! The holding thread can re-acquire the lock any number of times; each
//! acquisition produces its own guard, and the lock is released for other
//! threads only once every guard has been dropped.

use log::trace;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// A recursive mutex.
///
/// Unlike a plain mutex, the thread that currently holds this lock can call
/// [`lock`](Self::lock) or [`try_lock`](Self::try_lock) again without
/// deadlocking; the recursion depth is the number of live guards. Other
/// threads block (or fail, for `try_lock`) until the depth returns to zero.
///
/// Construction never fails and the lock is never copied; share it between
/// threads behind an `Arc`.
pub struct RecursiveMutex {
    /// The underlying reentrant lock; the unit payload carries no data,
    /// only ownership
    inner: ReentrantMutex<()>,

    /// Name of this mutex for debugging
    name: Option<String>,
}

/// A guard representing one level of ownership of a [`RecursiveMutex`].
///
/// Dropping the guard releases that level. The guard is deliberately not
/// `Send`: ownership levels cannot migrate to another thread.
pub struct RecursiveMutexGuard<'a> {
    /// The underlying reentrant guard
    _guard: ReentrantMutexGuard<'a, ()>,

    /// Name of the mutex
    name: Option<&'a str>,
}

impl RecursiveMutex {
    /// Create a new, unheld recursive mutex.
    pub fn new() -> Self {
        Self {
            inner: ReentrantMutex::new(()),
            name: None,
        }
    }

    /// Create a new recursive mutex with a name for debugging.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            inner: ReentrantMutex::new(()),
            name: Some(name.into()),
        }
    }

    /// Acquire the lock, blocking until it is available.
    ///
    /// Returns immediately when the calling thread already holds the lock,
    /// adding one level of recursion.
    pub fn lock(&self) -> RecursiveMutexGuard<'_> {
        let guard = self.inner.lock();

        trace!(
            "Recursive lock acquired: {}",
            self.name.as_deref().unwrap_or("unnamed")
        );

        RecursiveMutexGuard {
            _guard: guard,
            name: self.name.as_deref(),
        }
    }

    /// Attempt to acquire the lock without blocking.
    ///
    /// Returns `None` when another thread holds the lock. Always succeeds
    /// for the thread that already holds it.
    pub fn try_lock(&self) -> Option<RecursiveMutexGuard<'_>> {
        let guard = self.inner.try_lock()?;

        trace!(
            "Recursive lock acquired (try_lock): {}",
            self.name.as_deref().unwrap_or("unnamed")
        );

        Some(RecursiveMutexGuard {
            _guard: guard,
            name: self.name.as_deref(),
        })
    }

    /// Get the name of this mutex.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Default for RecursiveMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RecursiveMutexGuard<'_> {
    fn drop(&mut self) {
        trace!(
            "Recursive lock released: {}",
            self.name.unwrap_or("unnamed")
        );
    }
}
