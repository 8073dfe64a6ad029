//! Signal/wait events for thread coordination.
//!
//! A [`WaitableEvent`] lets one thread block until another signals it, with
//! an optional millisecond timeout. Events come in two flavours: auto-reset
//! events consume the signal on the first successful wait, manual-reset
//! events stay triggered until explicitly cleared.

use log::trace;
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Wait indefinitely; any negative timeout has the same meaning.
pub const WAIT_FOREVER: i64 = -1;

/// A condition-variable backed event.
///
/// The triggered flag is only ever read or written under the internal mutex,
/// and waiters re-check it after every wake, so a spurious condvar wake can
/// never be mistaken for a signal.
pub struct WaitableEvent {
    /// The triggered flag, guarded by its own mutex
    triggered: Mutex<bool>,

    /// Waiters park here until signalled
    condition: Condvar,

    /// Whether a successful wait leaves the event triggered
    manual_reset: bool,
}

impl WaitableEvent {
    /// Create a new, untriggered event.
    ///
    /// With `manual_reset == false` the event auto-resets: each `signal`
    /// is consumed by exactly one successful [`wait`](Self::wait).
    pub fn new(manual_reset: bool) -> Self {
        Self {
            triggered: Mutex::new(false),
            condition: Condvar::new(),
            manual_reset,
        }
    }

    /// Create an auto-reset event.
    pub fn auto_reset() -> Self {
        Self::new(false)
    }

    /// Create a manual-reset event.
    pub fn manual_reset() -> Self {
        Self::new(true)
    }

    /// Trigger the event, waking all current waiters.
    ///
    /// For a manual-reset event the triggered state persists until
    /// [`reset`](Self::reset); for an auto-reset event the first successful
    /// wait consumes it.
    pub fn signal(&self) {
        let mut triggered = self.triggered.lock();
        *triggered = true;
        self.condition.notify_all();
    }

    /// Clear the triggered state.
    pub fn reset(&self) {
        *self.triggered.lock() = false;
    }

    /// Block until the event is triggered or the timeout elapses.
    ///
    /// A negative `timeout_ms` (see [`WAIT_FOREVER`]) waits indefinitely;
    /// zero performs a single non-blocking check. Returns `true` if the
    /// event was observed triggered, `false` on timeout.
    pub fn wait(&self, timeout_ms: i64) -> bool {
        let mut triggered = self.triggered.lock();

        if !*triggered {
            if timeout_ms < 0 {
                while !*triggered {
                    self.condition.wait(&mut triggered);
                }
            } else {
                let deadline = Instant::now() + Duration::from_millis(timeout_ms as u64);

                while !*triggered {
                    let result = self.condition.wait_until(&mut triggered, deadline);

                    // The flag takes precedence over the timeout verdict: a
                    // signal that lands just as the deadline expires still
                    // counts as a successful wait
                    if result.timed_out() && !*triggered {
                        trace!("Event wait timed out after {}ms", timeout_ms);
                        return false;
                    }
                }
            }
        }

        if !self.manual_reset {
            *triggered = false;
        }

        true
    }

    /// Whether this event is manual-reset.
    pub fn is_manual_reset(&self) -> bool {
        self.manual_reset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_signal_before_wait() {
        let event = WaitableEvent::auto_reset();

        event.signal();
        assert!(event.wait(0));
    }

    #[test]
    fn test_auto_reset_consumes_signal() {
        let event = WaitableEvent::auto_reset();

        event.signal();
        assert!(event.wait(0));

        // The first successful wait consumed the signal
        assert!(!event.wait(0));
        assert!(!event.wait(20));
    }

    #[test]
    fn test_manual_reset_persists_until_reset() {
        let event = WaitableEvent::manual_reset();

        event.signal();
        assert!(event.wait(0));
        assert!(event.wait(0));
        assert!(event.wait(WAIT_FOREVER));

        event.reset();
        assert!(!event.wait(0));
    }

    #[test]
    fn test_timeout_lower_bound() {
        let event = WaitableEvent::auto_reset();

        let start = Instant::now();
        assert!(!event.wait(50));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_signal_wakes_waiting_thread() {
        let event = Arc::new(WaitableEvent::auto_reset());

        let event_clone = Arc::clone(&event);
        let waiter = thread::spawn(move || event_clone.wait(WAIT_FOREVER));

        // Give the waiter time to park before signalling
        thread::sleep(Duration::from_millis(20));
        event.signal();

        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_manual_reset_wakes_all_waiters() {
        let event = Arc::new(WaitableEvent::manual_reset());

        let mut waiters = vec![];
        for _ in 0..4 {
            let event = Arc::clone(&event);
            waiters.push(thread::spawn(move || event.wait(5000)));
        }

        thread::sleep(Duration::from_millis(20));
        event.signal();

        for waiter in waiters {
            assert!(waiter.join().unwrap());
        }
    }

    #[test]
    fn test_reset_before_signal_is_harmless() {
        let event = WaitableEvent::auto_reset();

        event.reset();
        assert!(!event.wait(0));

        event.signal();
        assert!(event.wait(0));
    }
}
