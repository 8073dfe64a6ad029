//! Intra-process synchronization primitives.
//!
//! This module provides the blocking coordination tools used within a single
//! process:
//!
//! - A recursive mutex that the holding thread can re-acquire freely
//! - A condition-variable backed event for signalling between threads

pub mod event;
pub mod mutex;

// Re-export key types from event
pub use event::WaitableEvent;

// Re-export key types from mutex
pub use mutex::{RecursiveMutex, RecursiveMutexGuard};
