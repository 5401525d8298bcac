//! The measurement protocol: warm-up, two timed runs, comparison.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::counter::OperationCounter;
use crate::error::BenchError;
use crate::interrupt::{Interrupt, Interrupted};
use crate::measurement::{Comparison, Measurement};
use crate::pool::FixedPool;
use crate::slot::{SlotRegistry, SlotSet};
use crate::strategy::SlotStrategy;
use crate::workload::{WarmUp, Workload};

/// Harness lifecycle. Phases only ever advance, in declaration order.
///
/// A phase names the step most recently started: the harness stays in
/// `WarmingUp` once the warm-up has returned, until strategy A is timed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Idle,
    WarmingUp,
    BenchmarkingA,
    BenchmarkingB,
    Reporting,
    Done,
}

impl Phase {
    /// The phase that follows this one, if any.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Idle => Some(Phase::WarmingUp),
            Phase::WarmingUp => Some(Phase::BenchmarkingA),
            Phase::BenchmarkingA => Some(Phase::BenchmarkingB),
            Phase::BenchmarkingB => Some(Phase::Reporting),
            Phase::Reporting => Some(Phase::Done),
            Phase::Done => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::WarmingUp => "warming up",
            Phase::BenchmarkingA => "benchmarking A",
            Phase::BenchmarkingB => "benchmarking B",
            Phase::Reporting => "reporting",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Everything a harness run needs to know up front.
#[derive(Clone, Debug)]
pub struct HarnessConfig {
    pub warm_up: WarmUp,
    pub workload: Workload,
}

impl HarnessConfig {
    pub fn new(warm_up: WarmUp, workload: Workload) -> Self {
        Self { warm_up, workload }
    }

    /// Five slots, 200 workers x 5000 iterations, 20-worker warm-up.
    pub fn high_concurrency() -> Self {
        Self::new(WarmUp::high_concurrency(), Workload::high_concurrency())
    }

    /// One text slot, 100 workers x 10000 iterations, 10-worker warm-up.
    pub fn single_slot() -> Self {
        Self::new(WarmUp::single_slot(), Workload::single_slot())
    }
}

/// How the warm-up went. Never an error: anomalies are only reported here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WarmUpOutcome {
    pub workers_completed: usize,
    pub workers_expected: usize,
    pub iterations: u64,
    pub elapsed: Duration,
    pub timed_out: bool,
    pub interrupted: bool,
}

impl WarmUpOutcome {
    pub fn is_complete(&self) -> bool {
        self.workers_completed == self.workers_expected
    }
}

/// Result of [`Harness::run`].
#[derive(Clone, Debug)]
pub struct Report {
    pub warm_up: WarmUpOutcome,
    pub baseline: Measurement,
    pub candidate: Measurement,
    pub comparison: Comparison,
}

/// Runs a fair head-to-head timing comparison of two slot strategies.
///
/// The harness owns the slot registry of the run; strategies should be built
/// from [`Harness::registry`] after the harness is created. Operations must
/// be called in lifecycle order:
///
/// `warm_up` -> `benchmark` (A) -> `benchmark` (B) -> `compare_and_report`
///
/// Any other order fails with [`BenchError::OutOfOrder`].
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
/// use std::sync::Arc;
/// use std::time::Duration;
/// use slotbench_core::{
///     Harness, HarnessConfig, IndexedSlots, SlotOp, ThreadLocalSlots, WarmUp, Workload,
/// };
///
/// let workers = NonZeroUsize::new(2).unwrap();
/// let config = HarnessConfig::new(
///     WarmUp { workers, iterations: 10, timeout: Duration::from_secs(5) },
///     Workload::new(workers, 50).with_ops(&[SlotOp::WriteNumber, SlotOp::ReadNumber]),
/// );
/// let harness = Harness::new(config).unwrap();
/// let general = Arc::new(ThreadLocalSlots::new());
/// let optimized = Arc::new(IndexedSlots::new(harness.registry()));
///
/// let report = harness.run(&general, &optimized).unwrap();
/// assert_eq!(report.baseline.operations, 100);
/// assert_eq!(report.candidate.operations, 100);
/// ```
pub struct Harness {
    config: HarnessConfig,
    registry: SlotRegistry,
    slots: SlotSet,
    phase: Phase,
    interrupt: Interrupt,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Result<Self, BenchError> {
        config.workload.validate()?;
        let mut registry = SlotRegistry::new();
        let slots = SlotSet::declare(&mut registry);
        Ok(Self {
            config,
            registry,
            slots,
            phase: Phase::Idle,
            interrupt: Interrupt::new(),
        })
    }

    /// Replaces the harness's interrupt token, e.g. with one raised by a
    /// signal handler.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn registry(&self) -> &SlotRegistry {
        &self.registry
    }

    pub fn slots(&self) -> SlotSet {
        self.slots
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Handle that interrupts the harness's join-waits.
    pub fn interrupt_handle(&self) -> Interrupt {
        self.interrupt.clone()
    }

    fn advance(&mut self, expected: Phase) -> Result<Phase, BenchError> {
        if self.phase != expected {
            return Err(BenchError::OutOfOrder {
                expected,
                actual: self.phase,
            });
        }
        // Done never reaches here: no operation expects it
        let next = expected.next().unwrap_or(Phase::Done);
        info!(from = %self.phase, to = %next, "harness phase change");
        self.phase = next;
        Ok(next)
    }

    /// Runs the untimed warm-up against both strategies.
    ///
    /// Timeouts, spawn failures, panics, and interrupts during the wait are
    /// logged and tolerated; an interrupt is re-asserted on the harness token.
    /// The only error is calling this outside the idle phase.
    pub fn warm_up<A, B>(&mut self, a: &Arc<A>, b: &Arc<B>) -> Result<WarmUpOutcome, BenchError>
    where
        A: SlotStrategy,
        B: SlotStrategy,
    {
        self.advance(Phase::Idle)?;

        let warm_up = self.config.warm_up;
        let plan = warm_up.plan();
        let slots = self.slots;
        let iterations = warm_up.iterations;

        let start = Instant::now();
        let dispatch = FixedPool::new("slot-warmup", warm_up.workers).dispatch({
            let a = Arc::clone(a);
            let b = Arc::clone(b);
            move |_worker, stop| {
                let mut ctx_a = a.context();
                let mut ctx_b = b.context();
                let mut rng = fastrand::Rng::new();
                for j in 0..iterations {
                    if stop.is_interrupted() {
                        break;
                    }
                    plan.run(&slots, &mut ctx_a, &mut rng, j);
                    plan.run(&slots, &mut ctx_b, &mut rng, j);
                }
            }
        });

        let (finished, interrupted) = match dispatch.wait(warm_up.timeout, &self.interrupt) {
            Ok(finished) => (finished, false),
            Err(Interrupted) => {
                warn!("warm-up wait interrupted, proceeding");
                self.interrupt.reassert();
                (false, true)
            }
        };

        let outcome = WarmUpOutcome {
            workers_completed: dispatch.completed(),
            workers_expected: dispatch.expected(),
            iterations,
            elapsed: start.elapsed(),
            timed_out: !finished && !interrupted,
            interrupted,
        };

        if finished {
            if let Err(err) = dispatch.join() {
                warn!(error = %err, "warm-up worker failed, proceeding");
            }
        } else {
            if outcome.timed_out {
                warn!(
                    completed = outcome.workers_completed,
                    expected = outcome.workers_expected,
                    timeout = ?warm_up.timeout,
                    "warm-up did not finish in time, proceeding"
                );
            }
            dispatch.abandon();
        }

        debug!(?outcome, "warm-up finished");
        Ok(outcome)
    }

    /// Times one strategy under the configured workload.
    ///
    /// The first call measures strategy A, the second strategy B.
    ///
    /// # Errors
    ///
    /// * [`BenchError::WorkersTimedOut`] if the join bound elapses first; the
    ///   error carries how many workers finished and the counter value.
    /// * [`BenchError::Interrupted`] if the harness token is raised while
    ///   waiting.
    /// * [`BenchError::Spawn`] / [`BenchError::WorkerPanicked`].
    pub fn benchmark<S: SlotStrategy>(&mut self, strategy: &Arc<S>) -> Result<Measurement, BenchError> {
        let expected = match self.phase {
            phase @ (Phase::WarmingUp | Phase::BenchmarkingA) => phase,
            // report the closest phase the call would have been valid in
            actual => {
                let expected = if actual < Phase::WarmingUp {
                    Phase::WarmingUp
                } else {
                    Phase::BenchmarkingA
                };
                return Err(BenchError::OutOfOrder { expected, actual });
            }
        };
        let phase = self.advance(expected)?;
        measure(
            &self.config.workload,
            self.slots,
            strategy,
            &self.interrupt,
            phase,
        )
    }

    /// Compares the two measurements and finishes the run.
    pub fn compare_and_report(
        &mut self,
        a: &Measurement,
        b: &Measurement,
    ) -> Result<Comparison, BenchError> {
        self.advance(Phase::BenchmarkingB)?;
        let comparison = Comparison::between(a, b);
        info!(ratio = comparison.ratio(), verdict = ?comparison.verdict(), "{comparison}");
        self.advance(Phase::Reporting)?;
        Ok(comparison)
    }

    /// Runs the whole protocol with `a` as baseline and `b` as candidate.
    pub fn run<A, B>(mut self, a: &Arc<A>, b: &Arc<B>) -> Result<Report, BenchError>
    where
        A: SlotStrategy,
        B: SlotStrategy,
    {
        let warm_up = self.warm_up(a, b)?;
        let baseline = self.benchmark(a)?;
        let candidate = self.benchmark(b)?;
        let comparison = self.compare_and_report(&baseline, &candidate)?;
        Ok(Report {
            warm_up,
            baseline,
            candidate,
            comparison,
        })
    }
}

/// Times `strategy` under `workload`, outside of any harness lifecycle.
///
/// `phase` is only used to label errors and logs.
pub fn measure<S: SlotStrategy>(
    workload: &Workload,
    slots: SlotSet,
    strategy: &Arc<S>,
    interrupt: &Interrupt,
    phase: Phase,
) -> Result<Measurement, BenchError> {
    let counter = Arc::new(OperationCounter::new());
    let plan = workload.plan();
    let ops_per_worker = workload.ops_per_worker();

    debug!(strategy = strategy.name(), %workload, "starting timed run");

    let start = Instant::now();
    let dispatch = FixedPool::new("slot-worker", workload.workers()).dispatch({
        let strategy = Arc::clone(strategy);
        let counter = Arc::clone(&counter);
        move |_worker, stop| {
            let mut ctx = strategy.context();
            // one generator per worker, never shared
            let mut rng = fastrand::Rng::new();
            for j in 0..ops_per_worker {
                if stop.is_interrupted() {
                    break;
                }
                plan.run(&slots, &mut ctx, &mut rng, j);
                counter.record();
            }
        }
    });

    let waited = dispatch.wait(workload.join_timeout(), interrupt);
    let elapsed = start.elapsed();

    match waited {
        Ok(true) => {}
        Ok(false) => {
            let err = BenchError::WorkersTimedOut {
                phase,
                completed: dispatch.completed(),
                expected: dispatch.expected(),
                operations: counter.total(),
            };
            dispatch.abandon();
            return Err(err);
        }
        Err(Interrupted) => {
            dispatch.abandon();
            return Err(BenchError::Interrupted);
        }
    }

    let workers_expected = dispatch.expected();
    let workers_completed = dispatch.completed();
    dispatch.join()?;

    let measurement = Measurement {
        strategy: strategy.name(),
        elapsed,
        operations: counter.total(),
        workers_completed,
        workers_expected,
    };
    info!(
        strategy = measurement.strategy,
        elapsed_ms = %measurement.elapsed_ms(),
        operations = measurement.operations,
        "timed run finished"
    );
    Ok(measurement)
}
