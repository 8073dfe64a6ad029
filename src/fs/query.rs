//! Stat-based filesystem queries and entry manipulation.
//!
//! Free functions over paths: existence and type checks, sizes, deletion,
//! move with a copy fallback, directory creation, the process working
//! directory, and volume space statistics. All of them return sentinel
//! values on failure and never panic.

use log::{debug, warn};
use std::path::{Path, PathBuf};

/// How many ancestors to try when the queried path does not exist yet.
#[cfg(unix)]
const VOLUME_QUERY_ANCESTOR_LIMIT: usize = 5;

/// Whether a filesystem entry of any type is present at `path`.
///
/// The empty path does not exist.
pub fn exists(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.metadata().is_ok()
}

/// Like [`exists`], but directories do not count.
pub fn file_exists(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .metadata()
            .map(|meta| !meta.is_dir())
            .unwrap_or(false)
}

/// Whether `path` names a directory.
///
/// The empty path vacuously counts as a directory, as a "root/current"
/// convenience for callers that treat it that way.
pub fn is_directory(path: &Path) -> bool {
    path.as_os_str().is_empty()
        || path.metadata().map(|meta| meta.is_dir()).unwrap_or(false)
}

/// The byte length of the entry at `path`.
///
/// Returns `0` when the entry cannot be stat'ed, so a missing file is
/// indistinguishable from a genuinely empty one.
pub fn size(path: &Path) -> u64 {
    if path.as_os_str().is_empty() {
        return 0;
    }
    path.metadata().map(|meta| meta.len()).unwrap_or(0)
}

/// Whether the calling process may write to `path`.
#[cfg(unix)]
pub fn can_write(path: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    CString::new(path.as_os_str().as_bytes())
        .map(|c_path| unsafe { libc::access(c_path.as_ptr(), libc::W_OK) } == 0)
        .unwrap_or(false)
}

/// Whether the calling process may write to `path`.
#[cfg(not(unix))]
pub fn can_write(path: &Path) -> bool {
    path.metadata()
        .map(|meta| !meta.permissions().readonly())
        .unwrap_or(false)
}

/// Delete the entry at `path`, whether file or directory.
///
/// Directories must be empty. Returns whether the deletion succeeded.
pub fn delete(path: &Path) -> bool {
    let result = if is_directory(path) {
        std::fs::remove_dir(path)
    } else {
        std::fs::remove_file(path)
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            debug!("Failed to delete {}: {}", path.display(), e);
            false
        }
    }
}

/// Move `src` to `dest`.
///
/// Tries an atomic rename first; when that fails (typically across
/// filesystems) falls back to copy-then-delete-source. If the source delete
/// fails after a successful copy, the new destination is deleted again as a
/// best-effort rollback; should that also fail, data exists at both paths
/// and the call reports `false`.
pub fn move_entry(src: &Path, dest: &Path) -> bool {
    if std::fs::rename(src, dest).is_ok() {
        return true;
    }

    if can_write(src) && std::fs::copy(src, dest).is_ok() {
        if delete(src) {
            return true;
        }

        warn!(
            "Copied {} to {} but could not delete the source; rolling back",
            src.display(),
            dest.display()
        );
        delete(dest);
    }

    false
}

/// Create the directory `path` with default permissions.
///
/// A single-level creation; the result is deliberately discarded, so callers
/// verify through [`exists`] or [`is_directory`].
pub fn create_directory(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        let _ = std::fs::DirBuilder::new().mode(0o777).create(path);
    }
    #[cfg(not(unix))]
    {
        let _ = std::fs::DirBuilder::new().create(path);
    }
}

/// The process's current working directory, or an empty path on failure.
pub fn current_working_directory() -> PathBuf {
    std::env::current_dir().unwrap_or_default()
}

/// Change the process-wide current working directory to `path`.
pub fn set_current_working_directory(path: &Path) -> bool {
    std::env::set_current_dir(path).is_ok()
}

/// Walk upward from `path` to the nearest existing ancestor.
///
/// The queried path may not exist yet (a file about to be created); volume
/// statistics are taken from the closest ancestor that does, giving up after
/// a fixed number of steps.
#[cfg(unix)]
fn nearest_existing(path: &Path) -> PathBuf {
    let mut current = path.to_path_buf();

    for _ in 0..VOLUME_QUERY_ANCESTOR_LIMIT {
        if exists(&current) {
            break;
        }

        match current.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => current = parent.to_path_buf(),
            _ => break,
        }
    }

    current
}

#[cfg(unix)]
fn volume_stats(path: &Path) -> Option<libc::statvfs> {
    use std::ffi::CString;
    use std::mem::MaybeUninit;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(nearest_existing(path).as_os_str().as_bytes()).ok()?;
    let mut stats = MaybeUninit::<libc::statvfs>::uninit();

    // Safety: statvfs writes the full struct on success, which is the only
    // case in which we read it
    let result = unsafe { libc::statvfs(c_path.as_ptr(), stats.as_mut_ptr()) };
    if result == 0 {
        Some(unsafe { stats.assume_init() })
    } else {
        None
    }
}

/// Bytes free on the volume holding `path`, or `0` on failure.
///
/// Counts only blocks available to unprivileged callers, so the figure is
/// conservative compared with what the super-user could still write.
#[cfg(unix)]
pub fn free_space(path: &Path) -> u64 {
    volume_stats(path)
        .map(|stats| stats.f_frsize as u64 * stats.f_bavail as u64)
        .unwrap_or(0)
}

/// Bytes free on the volume holding `path`, or `0` on failure.
#[cfg(not(unix))]
pub fn free_space(_path: &Path) -> u64 {
    0
}

/// Total size in bytes of the volume holding `path`, or `0` on failure.
#[cfg(unix)]
pub fn total_space(path: &Path) -> u64 {
    volume_stats(path)
        .map(|stats| stats.f_frsize as u64 * stats.f_blocks as u64)
        .unwrap_or(0)
}

/// Total size in bytes of the volume holding `path`, or `0` on failure.
#[cfg(not(unix))]
pub fn total_space(_path: &Path) -> u64 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_exists_and_file_exists() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("present.txt");
        std::fs::write(&file, b"x").unwrap();

        assert!(exists(&file));
        assert!(exists(dir.path()));
        assert!(!exists(&dir.path().join("absent.txt")));
        assert!(!exists(Path::new("")));

        // Directories are excluded from file_exists
        assert!(file_exists(&file));
        assert!(!file_exists(dir.path()));
        assert!(!file_exists(&dir.path().join("absent.txt")));
    }

    #[test]
    fn test_is_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, b"").unwrap();

        assert!(is_directory(dir.path()));
        assert!(!is_directory(&file));
        assert!(!is_directory(&dir.path().join("absent")));

        // Documented vacuous case
        assert!(is_directory(Path::new("")));
    }

    #[test]
    fn test_size() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("sized.bin");
        std::fs::write(&file, vec![7u8; 321]).unwrap();

        assert_eq!(size(&file), 321);
        assert_eq!(size(&dir.path().join("absent.bin")), 0);
    }

    #[test]
    fn test_can_write() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("w.txt");
        std::fs::write(&file, b"x").unwrap();

        assert!(can_write(&file));
        assert!(!can_write(&dir.path().join("absent.txt")));
    }

    #[test]
    fn test_delete_dispatches_on_entry_type() {
        let dir = TempDir::new().unwrap();

        let file = dir.path().join("f");
        std::fs::write(&file, b"x").unwrap();
        assert!(delete(&file));
        assert!(!exists(&file));

        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        assert!(delete(&sub));
        assert!(!exists(&sub));

        assert!(!delete(&dir.path().join("absent")));
    }

    #[test]
    fn test_move_entry() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.bin");
        let dest = dir.path().join("dest.bin");
        std::fs::write(&src, b"payload").unwrap();

        assert!(move_entry(&src, &dest));
        assert!(!exists(&src));
        assert!(exists(&dest));
        assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
    }

    #[test]
    fn test_move_entry_missing_source_fails() {
        let dir = TempDir::new().unwrap();
        assert!(!move_entry(
            &dir.path().join("absent"),
            &dir.path().join("dest")
        ));
    }

    #[test]
    fn test_create_directory() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("made");

        create_directory(&sub);
        assert!(is_directory(&sub));

        // Creating an existing directory is silently ignored
        create_directory(&sub);
        assert!(is_directory(&sub));

        // Nested creation is single-level only
        let nested = dir.path().join("a/b/c");
        create_directory(&nested);
        assert!(!exists(&nested));
    }

    #[test]
    fn test_current_working_directory_is_not_empty() {
        let cwd = current_working_directory();
        assert!(!cwd.as_os_str().is_empty());
        assert!(is_directory(&cwd));
    }

    #[test]
    fn test_volume_space() {
        let dir = TempDir::new().unwrap();

        let free = free_space(dir.path());
        let total = total_space(dir.path());
        assert!(total > 0);
        assert!(free <= total);

        // A not-yet-existing child resolves through its ancestors
        let missing = dir.path().join("not/yet/here");
        assert_eq!(total_space(&missing), total);
    }
}
