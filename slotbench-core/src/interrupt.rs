use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Granularity at which bounded waits re-check the interrupt flag.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Returned by interruptible waits that observed an interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

/// Cooperative interruption token.
///
/// Cloning yields another handle to the same flag. Nothing is ever
/// force-stopped: code that waits checks the flag and gives up early.
///
/// Waits that observe the flag consume it and return [`Interrupted`]. A caller
/// that handles the interruption locally but wants outer code to still see
/// it calls [`Interrupt::reassert`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use slotbench_core::{CountDownLatch, Interrupt, Interrupted};
///
/// let latch = CountDownLatch::new(1);
/// let interrupt = Interrupt::new();
/// interrupt.interrupt();
///
/// // the wait gives up immediately and clears the flag
/// assert_eq!(
///     latch.wait_interruptible(Duration::from_secs(60), &interrupt),
///     Err(Interrupted)
/// );
/// assert!(!interrupt.is_interrupted());
///
/// // handled locally, re-raised for whoever checks next
/// interrupt.reassert();
/// assert!(interrupt.is_interrupted());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the interrupt flag.
    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Raises the flag again after a wait consumed it.
    pub fn reassert(&self) {
        self.interrupt();
    }

    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clears the flag, returning whether it was set.
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }
}
