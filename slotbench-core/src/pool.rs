use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::BenchError;
use crate::interrupt::{Interrupt, Interrupted};
use crate::latch::CountDownLatch;

/// Identity of one worker within a dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(usize);

impl WorkerId {
    pub const fn new(n: usize) -> Self {
        Self(n)
    }

    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// A fixed-size pool of OS threads, one task per thread.
///
/// Threads are spawned per dispatch and named `<name>-<n>`. There is no
/// work-stealing and no queue: worker `n` runs the task once with
/// `WorkerId::new(n)` and exits.
#[derive(Debug, Clone, Copy)]
pub struct FixedPool {
    name: &'static str,
    size: NonZeroUsize,
}

impl FixedPool {
    pub fn new(name: &'static str, size: NonZeroUsize) -> Self {
        Self { name, size }
    }

    /// Spawns every worker and returns immediately.
    ///
    /// The task receives the worker's id and a stop token; long-running
    /// tasks should return early once the token is raised. If a thread fails
    /// to spawn, no further workers are started and the error is kept for
    /// [`Dispatch::join`].
    pub fn dispatch<F>(&self, task: F) -> Dispatch
    where
        F: Fn(WorkerId, &Interrupt) + Send + Sync + 'static,
    {
        let expected = self.size.get();
        let latch = Arc::new(CountDownLatch::new(expected));
        let stop = Interrupt::new();
        let task = Arc::new(task);
        let mut handles = Vec::with_capacity(expected);
        let mut spawn_error = None;

        for n in 0..expected {
            let worker = WorkerId::new(n);
            let spawned = thread::Builder::new()
                .name(format!("{}-{}", self.name, n))
                .spawn({
                    let latch = Arc::clone(&latch);
                    let task = Arc::clone(&task);
                    let stop = stop.clone();
                    move || {
                        let _done = latch.guard();
                        task(worker, &stop);
                    }
                });
            match spawned {
                Ok(handle) => handles.push((worker, handle)),
                Err(source) => {
                    warn!(%worker, error = %source, "failed to spawn worker thread");
                    // release the latch slots of workers that will never run
                    for _ in n..expected {
                        latch.count_down();
                    }
                    spawn_error = Some(BenchError::Spawn { worker, source });
                    break;
                }
            }
        }

        debug!(pool = self.name, spawned = handles.len(), expected, "dispatched workers");

        Dispatch {
            latch,
            stop,
            handles,
            spawn_error,
            expected,
        }
    }
}

/// Workers started by [`FixedPool::dispatch`].
pub struct Dispatch {
    latch: Arc<CountDownLatch>,
    stop: Interrupt,
    handles: Vec<(WorkerId, JoinHandle<()>)>,
    spawn_error: Option<BenchError>,
    expected: usize,
}

impl Dispatch {
    /// Workers the pool was asked to run.
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Workers whose thread actually started.
    pub fn spawned(&self) -> usize {
        self.handles.len()
    }

    /// Spawned workers that have finished their task.
    pub fn completed(&self) -> usize {
        self.spawned().saturating_sub(self.latch.count())
    }

    /// Waits until every spawned worker finished, or `timeout` elapsed.
    ///
    /// Returns `Ok(true)` when all finished. An interrupt raised on
    /// `interrupt` ends the wait early with `Err(Interrupted)`.
    pub fn wait(&self, timeout: Duration, interrupt: &Interrupt) -> Result<bool, Interrupted> {
        self.latch.wait_interruptible(timeout, interrupt)
    }

    /// Joins all workers, reporting the first spawn failure or panic.
    ///
    /// Call only after [`wait`](Self::wait) returned `Ok(true)`.
    pub fn join(self) -> Result<(), BenchError> {
        let mut panicked = None;
        for (worker, handle) in self.handles {
            if handle.join().is_err() && panicked.is_none() {
                panicked = Some(worker);
            }
        }
        if let Some(err) = self.spawn_error {
            return Err(err);
        }
        match panicked {
            Some(worker) => Err(BenchError::WorkerPanicked { worker }),
            None => Ok(()),
        }
    }

    /// Asks unfinished workers to stop and lets them run out detached.
    pub fn abandon(self) {
        self.stop.interrupt();
        debug!(
            unfinished = self.spawned() - self.completed(),
            "abandoning workers"
        );
    }
}
