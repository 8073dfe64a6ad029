//! File handles and filesystem queries.
//!
//! This module provides the synchronous file layer:
//!
//! - Raw open/read/write/seek access through an owned [`FileHandle`]
//! - Stat-based path queries, entry manipulation, and volume statistics
//!
//! Every operation reports failure through a sentinel value (`false`, `0`,
//! `-1`, an invalid handle) instead of panicking or returning an error type.

pub mod file;
pub mod query;

// Re-export key types from file
pub use file::FileHandle;

// Re-export key functions from query
pub use query::{
    can_write, create_directory, current_working_directory, delete, exists, file_exists,
    free_space, is_directory, move_entry, set_current_working_directory, size, total_space,
};
