//! Raw synchronous file access.
//!
//! A [`FileHandle`] is a thin wrapper over an OS file descriptor with an
//! explicit validity state. An invalid handle turns every operation into a
//! no-op returning that operation's failure sentinel, so callers can open a
//! file and use the handle unconditionally, checking results as they go.

use log::debug;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::query;

/// An owned file handle with explicit validity.
///
/// Obtained from [`FileHandle::open`]; when the open fails, the returned
/// handle is invalid and every operation on it reports failure through its
/// sentinel value. The descriptor is closed on [`close`](Self::close) or
/// when the handle is dropped.
#[derive(Debug)]
pub struct FileHandle {
    /// The open file, or `None` for the invalid sentinel
    file: Option<File>,
}

impl FileHandle {
    /// Open `path`, creating it if `for_writing` is set and it is missing.
    ///
    /// Opening an existing file for writing positions the cursor at
    /// end-of-file, so the first write appends. Opening for reading is
    /// read-only. A failure at the OS level yields an invalid handle rather
    /// than an error.
    pub fn open(path: &Path, for_writing: bool) -> FileHandle {
        let result = if for_writing {
            if query::exists(path) {
                OpenOptions::new()
                    .read(true)
                    .write(true)
                    .open(path)
                    .and_then(|mut file| {
                        file.seek(SeekFrom::End(0))?;
                        Ok(file)
                    })
            } else {
                let mut options = OpenOptions::new();
                options.read(true).write(true).create(true);
                #[cfg(unix)]
                {
                    use std::os::unix::fs::OpenOptionsExt;
                    options.mode(0o644);
                }
                options.open(path)
            }
        } else {
            OpenOptions::new().read(true).open(path)
        };

        match result {
            Ok(file) => FileHandle { file: Some(file) },
            Err(e) => {
                debug!("Failed to open {}: {}", path.display(), e);
                FileHandle::invalid()
            }
        }
    }

    /// The invalid handle; every operation on it is a failing no-op.
    pub fn invalid() -> FileHandle {
        FileHandle { file: None }
    }

    /// Whether this handle refers to an open file.
    pub fn is_valid(&self) -> bool {
        self.file.is_some()
    }

    /// Read up to `buffer.len()` bytes at the current position.
    ///
    /// Returns the number of bytes read. Errors collapse to `0`, making a
    /// read failure indistinguishable from end-of-file; this mirrors the
    /// write asymmetry noted on [`write`](Self::write).
    pub fn read(&mut self, buffer: &mut [u8]) -> usize {
        match &mut self.file {
            Some(file) => file.read(buffer).unwrap_or(0),
            None => 0,
        }
    }

    /// Write `buffer` at the current position.
    ///
    /// Returns the number of bytes written, or `-1` on error. Unlike
    /// [`read`](Self::read), errors are distinguishable here; the asymmetry
    /// is part of the contract, kept for compatibility rather than fixed.
    pub fn write(&mut self, buffer: &[u8]) -> i64 {
        match &mut self.file {
            Some(file) => match file.write(buffer) {
                Ok(written) => written as i64,
                Err(_) => -1,
            },
            None => 0,
        }
    }

    /// Seek to an absolute position.
    ///
    /// Returns `pos` if the seek landed exactly there, `-1` otherwise.
    pub fn set_position(&mut self, pos: u64) -> i64 {
        match &mut self.file {
            Some(file) => match file.seek(SeekFrom::Start(pos)) {
                Ok(landed) if landed == pos => pos as i64,
                _ => -1,
            },
            None => -1,
        }
    }

    /// The current position, or `-1` on failure.
    pub fn position(&mut self) -> i64 {
        match &mut self.file {
            Some(file) => file
                .stream_position()
                .map(|pos| pos as i64)
                .unwrap_or(-1),
            None => -1,
        }
    }

    /// Ask the OS to sync modified data to the storage device.
    ///
    /// The result is discarded; durability is best-effort.
    pub fn flush(&mut self) {
        if let Some(file) = &mut self.file {
            let _ = file.sync_all();
        }
    }

    /// Close the handle, releasing the descriptor.
    ///
    /// Idempotent: closing an invalid handle is a no-op. The handle becomes
    /// invalid afterwards.
    pub fn close(&mut self) {
        self.file = None;
    }
}
