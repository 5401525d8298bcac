use std::sync::atomic::{AtomicU64, Ordering};

/// Aggregate operation counter shared by all workers of a run.
///
/// Increments use `Relaxed` ordering: only the final sum matters, and it is
/// read after the workers have been joined through the latch, which already
/// provides the needed happens-before edge.
///
/// # Examples
///
/// ```
/// use slotbench_core::OperationCounter;
///
/// let counter = OperationCounter::new();
/// counter.record();
/// counter.record();
/// assert_eq!(counter.total(), 2);
/// ```
#[derive(Debug, Default)]
pub struct OperationCounter {
    completed: AtomicU64,
}

impl OperationCounter {
    pub fn new() -> Self {
        Self {
            completed: AtomicU64::new(0),
        }
    }

    /// Records one completed operation.
    #[inline]
    pub fn record(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Total number of operations recorded so far.
    #[inline]
    pub fn total(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }
}
