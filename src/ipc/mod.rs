//! Cross-process mutual exclusion.
//!
//! Cooperating processes rendezvous on a named file in the platform
//! temporary directory and serialize through an exclusive advisory lock on
//! it. Only processes that take the lock respect it; the file's content is
//! never used.

pub mod lock;

// Re-export key types from lock
pub use lock::{InterProcessGuard, InterProcessLock, LockError};

#[cfg(test)]
mod tests {
    // Integration tests for the ipc module can be added here
}
