use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::interrupt::{Interrupt, Interrupted, POLL_INTERVAL};

/// Countdown latch: waiters block until the count reaches zero.
///
/// Uses `parking_lot` primitives, so there is no lock poisoning to handle
/// when a worker panics.
#[derive(Debug)]
pub struct CountDownLatch {
    remaining: Mutex<usize>,
    zero: Condvar,
}

impl CountDownLatch {
    pub fn new(count: usize) -> Self {
        Self {
            remaining: Mutex::new(count),
            zero: Condvar::new(),
        }
    }

    /// Decrements the count, waking waiters when it hits zero.
    pub fn count_down(&self) {
        let mut remaining = self.remaining.lock();
        if *remaining > 0 {
            *remaining -= 1;
            if *remaining == 0 {
                self.zero.notify_all();
            }
        }
    }

    pub fn count(&self) -> usize {
        *self.remaining.lock()
    }

    /// Waits until the count reaches zero, `timeout` elapses, or
    /// `interrupt` is raised.
    ///
    /// Returns `Ok(true)` if the count reached zero and `Ok(false)` on
    /// timeout. An observed interrupt is consumed and reported as
    /// `Err(Interrupted)`.
    pub fn wait_interruptible(
        &self,
        timeout: Duration,
        interrupt: &Interrupt,
    ) -> Result<bool, Interrupted> {
        let deadline = Instant::now() + timeout;
        let mut remaining = self.remaining.lock();
        while *remaining > 0 {
            if interrupt.take() {
                return Err(Interrupted);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            let slice = POLL_INTERVAL.min(deadline - now);
            self.zero.wait_for(&mut remaining, slice);
        }
        Ok(true)
    }

    /// Returns a guard that counts down when dropped, even on unwind.
    pub fn guard(&self) -> LatchGuard<'_> {
        LatchGuard { latch: self }
    }
}

/// Counts its latch down on drop.
pub struct LatchGuard<'a> {
    latch: &'a CountDownLatch,
}

impl Drop for LatchGuard<'_> {
    fn drop(&mut self) {
        self.latch.count_down();
    }
}
