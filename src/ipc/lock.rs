//! Inter-process lock over a rendezvous file.
//!
//! The lock is an exclusive advisory lock on a named file in the platform
//! temporary directory. Within a process, nested acquisitions on one
//! [`InterProcessLock`] are reference-counted, because the OS lock belongs
//! to the descriptor and cannot be re-taken by its own holder. The
//! rendezvous file persists across runs; only its lock state matters.

use fs2::FileExt;
use log::{debug, trace, warn};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Pause between acquisition attempts while the lock is contended.
///
/// The OS primitive only offers blocking-or-immediate acquisition, so a
/// bounded timeout is implemented as polling with this fixed interval.
/// TODO: exponential backoff would reduce wakeups under long contention.
const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Error when acquiring an inter-process lock.
#[derive(Error, Debug)]
pub enum LockError {
    /// The rendezvous file could not be opened or created
    #[error("could not open lock file for '{0}'")]
    Open(String),

    /// The lock was not acquired within the requested timeout
    #[error("timed out acquiring inter-process lock '{0}'")]
    Timeout(String),
}

/// The held half of the state machine: an open, locked descriptor plus the
/// nesting depth within this process.
struct Held {
    /// Keeps the descriptor (and with it the advisory lock) alive
    file: File,

    /// Nested successful `enter` calls not yet matched by `exit`
    ref_count: usize,
}

/// Mutual exclusion between cooperating processes.
///
/// Two instances (in the same process or different ones) constructed with
/// the same name contend for the same lock. At most one holds it at a time;
/// a holder can re-enter, and releases the OS lock once every `enter` has
/// been matched by an `exit`.
///
/// No fairness is guaranteed among waiters: acquisition polls at a fixed
/// interval, so starvation under heavy contention is possible.
pub struct InterProcessLock {
    /// Identifies the rendezvous file shared by all contenders
    name: String,

    /// `None` while unlocked; serializes enter/exit across threads
    state: Mutex<Option<Held>>,
}

impl InterProcessLock {
    /// Create a lock contending on `name`.
    ///
    /// No I/O happens until the first [`enter`](Self::enter).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(None),
        }
    }

    /// The name this lock rendezvouses on.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The path of the rendezvous file for this lock.
    pub fn lock_file_path(&self) -> PathBuf {
        std::env::temp_dir().join(&self.name)
    }

    /// Current nesting depth within this instance; `0` when not held.
    pub fn depth(&self) -> usize {
        self.state.lock().as_ref().map_or(0, |held| held.ref_count)
    }

    /// Acquire the lock, waiting up to `timeout_ms` milliseconds.
    ///
    /// A negative timeout waits indefinitely; zero makes a single attempt.
    /// Re-entering from the holding instance succeeds immediately and
    /// increments the nesting depth without touching the OS lock. Each
    /// success must be matched by one [`exit`](Self::exit).
    pub fn try_enter(&self, timeout_ms: i64) -> Result<(), LockError> {
        let mut state = self.state.lock();

        if let Some(held) = state.as_mut() {
            held.ref_count += 1;
            trace!(
                "Re-entered inter-process lock '{}' (depth {})",
                self.name,
                held.ref_count
            );
            return Ok(());
        }

        let file = self.acquire(timeout_ms)?;
        *state = Some(Held { file, ref_count: 1 });
        trace!("Acquired inter-process lock '{}'", self.name);
        Ok(())
    }

    /// [`try_enter`](Self::try_enter) with the failure reason collapsed to a
    /// boolean.
    pub fn enter(&self, timeout_ms: i64) -> bool {
        self.try_enter(timeout_ms).is_ok()
    }

    /// Release one level of ownership.
    ///
    /// When the depth reaches zero the advisory lock is released and the
    /// descriptor closed. Calling `exit` without a matching successful
    /// `enter` is a no-op.
    pub fn exit(&self) {
        let mut state = self.state.lock();

        let fully_released = match state.as_mut() {
            Some(held) => {
                held.ref_count -= 1;
                held.ref_count == 0
            }
            None => false,
        };

        if fully_released {
            if let Some(held) = state.take() {
                Self::release(held.file);
                trace!("Released inter-process lock '{}'", self.name);
            }
        }
    }

    /// Acquire the lock and wrap it in a guard that calls
    /// [`exit`](Self::exit) when dropped.
    pub fn guard(&self, timeout_ms: i64) -> Option<InterProcessGuard<'_>> {
        self.enter(timeout_ms).then_some(InterProcessGuard { lock: self })
    }

    /// Open the rendezvous file and take the advisory lock, polling until
    /// success or the timeout budget runs out.
    fn acquire(&self, timeout_ms: i64) -> Result<File, LockError> {
        let path = self.lock_file_path();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|e| {
                debug!("Could not open lock file {}: {}", path.display(), e);
                LockError::Open(self.name.clone())
            })?;

        let deadline = (timeout_ms > 0)
            .then(|| Instant::now() + Duration::from_millis(timeout_ms as u64));

        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(file),

                // An interrupted attempt consumes no timeout budget
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,

                Err(e) => {
                    let expired = timeout_ms == 0
                        || deadline.is_some_and(|d| Instant::now() >= d);

                    if expired {
                        if timeout_ms != 0 {
                            warn!(
                                "Timed out acquiring inter-process lock '{}' after {}ms: {}",
                                self.name, timeout_ms, e
                            );
                        }
                        // Dropping the file closes the descriptor
                        return Err(LockError::Timeout(self.name.clone()));
                    }

                    thread::sleep(RETRY_INTERVAL);
                }
            }
        }
    }

    /// Drop the advisory lock, retrying an interrupted release until it
    /// goes through, then close the descriptor.
    fn release(file: File) {
        loop {
            match FileExt::unlock(&file) {
                Ok(()) => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    // Closing the descriptor releases the lock regardless
                    debug!("Unlock failed, relying on close: {}", e);
                    break;
                }
            }
        }
    }
}

impl Drop for InterProcessLock {
    fn drop(&mut self) {
        // An instance dropped while held still releases the OS lock: the
        // descriptor closes with the contained state
        if let Some(held) = self.state.get_mut().take() {
            Self::release(held.file);
        }
    }
}

/// RAII ownership of an [`InterProcessLock`].
///
/// Produced by [`InterProcessLock::guard`]; dropping it releases one level
/// of ownership.
pub struct InterProcessGuard<'a> {
    /// The lock to exit on drop
    lock: &'a InterProcessLock,
}

impl Drop for InterProcessGuard<'_> {
    fn drop(&mut self) {
        self.lock.exit();
    }
}
