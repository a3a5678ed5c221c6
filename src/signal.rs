//! Coalescing redraw signal shared between nodes and the render loop.

use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Why [`RedrawSignal::wait`] returned.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Wake {
    /// At least one redraw was requested since the last wait.
    Requested,
    /// The fallback interval elapsed with nothing pending.
    TimedOut,
}

/// An auto-reset flag: any number of [`request`](Self::request) calls between two waits
/// collapse into a single wakeup.
#[derive(Debug, Default)]
pub(crate) struct RedrawSignal {
    pending: Mutex<bool>,
    ready: Condvar,
}

impl RedrawSignal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Marks a frame as owed. Never blocks beyond the flag's critical section.
    pub(crate) fn request(&self) {
        let mut pending = self.pending.lock();
        if !*pending {
            *pending = true;
            self.ready.notify_one();
        }
    }

    /// Blocks until a request arrives or `timeout` elapses, consuming the pending flag.
    pub(crate) fn wait(&self, timeout: Duration) -> Wake {
        let mut pending = self.pending.lock();
        if !*pending {
            // Spurious wakeups just produce an early TimedOut, which is harmless.
            let _ = self.ready.wait_for(&mut pending, timeout);
        }

        if std::mem::take(&mut *pending) {
            Wake::Requested
        } else {
            Wake::TimedOut
        }
    }
}
