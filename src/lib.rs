#![deny(warnings)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

//! # Syncpoint
//!
//! Synchronization and filesystem primitives for cooperating threads and
//! processes.
//!
//! This crate provides a small, synchronous, blocking toolkit:
//!
//! - Recursive intra-process mutual exclusion
//! - Signal/wait events with manual/auto-reset modes and millisecond timeouts
//! - Advisory-file-lock based mutual exclusion between processes
//! - Uniform file metadata, existence, and raw read/write/seek access
//!
//! ## Failure model
//!
//! Expected failures are reported through sentinel return values (`false`,
//! `0`, `-1`, an invalid handle) rather than panics or propagated errors, so
//! every fallible operation can be called unconditionally and checked by the
//! caller. The model is OS threads throughout: waiting operations block the
//! calling thread, and there is no event loop or async surface.

/// Intra-process synchronization primitives
pub mod sync;

/// File handles and filesystem queries
pub mod fs;

/// Cross-process mutual exclusion
pub mod ipc;

// Re-export key types for easier access
pub use fs::file::FileHandle;
pub use ipc::lock::InterProcessLock;
pub use sync::event::WaitableEvent;
pub use sync::mutex::RecursiveMutex;
