use std::fmt;
use std::hint::black_box;
use std::num::{NonZeroU64, NonZeroUsize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::BenchError;
use crate::slot::SlotSet;
use crate::strategy::SlotAccess;

const fn non_zero(n: usize) -> NonZeroUsize {
    match NonZeroUsize::new(n) {
        Some(n) => n,
        None => panic!("worker count must be non-zero"),
    }
}

const fn non_zero_u64(n: u64) -> NonZeroU64 {
    match NonZeroU64::new(n) {
        Some(n) => n,
        None => panic!("clear interval must be non-zero"),
    }
}

/// Default bound on the benchmark join-wait.
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(60);

/// Default clear interval: every 100th iteration clears the text slot.
pub const DEFAULT_CLEAR_EVERY: NonZeroU64 = non_zero_u64(100);

/// One step of a workload iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotOp {
    /// Read the text slot.
    ReadText,
    /// Write `value-<j>` to the text slot.
    WriteText,
    ReadNumber,
    /// Write the iteration index to the number slot, saturating at
    /// `i32::MAX`.
    WriteNumber,
    /// Insert `key<j>` with a worker-local random value into the mapping slot.
    InsertMapping,
    /// Append `item-<j>` to the sequence slot.
    AppendSequence,
    ReadTimestamp,
    /// Store the current instant in the timestamp slot.
    WriteTimestamp,
}

impl SlotOp {
    /// Every operation, touching every standard slot.
    pub const ALL: [SlotOp; 8] = [
        SlotOp::ReadText,
        SlotOp::WriteText,
        SlotOp::ReadNumber,
        SlotOp::WriteNumber,
        SlotOp::InsertMapping,
        SlotOp::AppendSequence,
        SlotOp::WriteTimestamp,
        SlotOp::ReadTimestamp,
    ];

    /// Applies this operation for iteration `j`.
    #[inline]
    pub fn apply<C: SlotAccess>(self, slots: &SlotSet, ctx: &mut C, rng: &mut fastrand::Rng, j: u64) {
        match self {
            SlotOp::ReadText => {
                black_box(ctx.update(&slots.text, |text| text.len()));
            }
            SlotOp::WriteText => ctx.set(&slots.text, format!("value-{j}")),
            SlotOp::ReadNumber => {
                black_box(ctx.get(&slots.number));
            }
            SlotOp::WriteNumber => ctx.set(&slots.number, i32::try_from(j).unwrap_or(i32::MAX)),
            SlotOp::InsertMapping => {
                let value = rng.i32(..);
                ctx.update(&slots.mapping, |map| map.insert(format!("key{j}"), value));
            }
            SlotOp::AppendSequence => {
                ctx.update(&slots.sequence, |items| items.push(format!("item-{j}")));
            }
            SlotOp::ReadTimestamp => {
                black_box(ctx.get(&slots.timestamp));
            }
            SlotOp::WriteTimestamp => ctx.set(&slots.timestamp, Instant::now()),
        }
    }
}

/// The per-iteration script every worker follows.
#[derive(Clone, Debug)]
pub struct IterationPlan {
    ops: Arc<[SlotOp]>,
    clear_every: Option<NonZeroU64>,
}

impl IterationPlan {
    pub fn new(ops: &[SlotOp], clear_every: Option<NonZeroU64>) -> Self {
        Self {
            ops: ops.into(),
            clear_every,
        }
    }

    /// Runs iteration `j`: every operation in order, then the periodic clear.
    #[inline]
    pub fn run<C: SlotAccess>(&self, slots: &SlotSet, ctx: &mut C, rng: &mut fastrand::Rng, j: u64) {
        for op in self.ops.iter() {
            op.apply(slots, ctx, rng, j);
        }
        if let Some(every) = self.clear_every {
            if j % every.get() == 0 {
                ctx.clear(&slots.text);
            }
        }
    }
}

/// Shape of a timed benchmark run.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
/// use slotbench_core::{SlotOp, Workload};
///
/// let workload = Workload::new(NonZeroUsize::new(10).unwrap(), 100)
///     .with_ops(&[SlotOp::WriteNumber, SlotOp::ReadNumber])
///     .without_clear();
/// assert_eq!(workload.expected_operations(), 1000);
/// ```
#[derive(Clone, Debug)]
pub struct Workload {
    workers: NonZeroUsize,
    ops_per_worker: u64,
    ops: Vec<SlotOp>,
    clear_every: Option<NonZeroU64>,
    join_timeout: Duration,
}

impl Workload {
    /// A workload running every [`SlotOp`] with the default clear interval
    /// and join timeout.
    pub fn new(workers: NonZeroUsize, ops_per_worker: u64) -> Self {
        Self {
            workers,
            ops_per_worker,
            ops: SlotOp::ALL.to_vec(),
            clear_every: Some(DEFAULT_CLEAR_EVERY),
            join_timeout: DEFAULT_JOIN_TIMEOUT,
        }
    }

    /// 200 workers x 5000 iterations over all five slots.
    pub fn high_concurrency() -> Self {
        Self::new(non_zero(200), 5000)
    }

    /// 100 workers x 10000 iterations of read / write on the text slot.
    pub fn single_slot() -> Self {
        Self::new(non_zero(100), 10_000).with_ops(&[SlotOp::ReadText, SlotOp::WriteText])
    }

    pub fn with_ops(mut self, ops: &[SlotOp]) -> Self {
        self.ops = ops.to_vec();
        self
    }

    pub fn with_clear_every(mut self, every: NonZeroU64) -> Self {
        self.clear_every = Some(every);
        self
    }

    pub fn without_clear(mut self) -> Self {
        self.clear_every = None;
        self
    }

    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    pub fn workers(&self) -> NonZeroUsize {
        self.workers
    }

    pub fn ops_per_worker(&self) -> u64 {
        self.ops_per_worker
    }

    pub fn ops(&self) -> &[SlotOp] {
        &self.ops
    }

    pub fn clear_every(&self) -> Option<NonZeroU64> {
        self.clear_every
    }

    pub fn join_timeout(&self) -> Duration {
        self.join_timeout
    }

    /// Counter value a fully completed run ends with.
    pub fn expected_operations(&self) -> u64 {
        self.workers.get() as u64 * self.ops_per_worker
    }

    pub fn plan(&self) -> IterationPlan {
        IterationPlan::new(&self.ops, self.clear_every)
    }

    pub fn validate(&self) -> Result<(), BenchError> {
        if self.ops.is_empty() {
            return Err(BenchError::InvalidWorkload(
                "the operation list is empty".to_string(),
            ));
        }
        if self.join_timeout.is_zero() {
            return Err(BenchError::InvalidWorkload(
                "the join timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} workers x {} iterations of {} slot operations",
            self.workers,
            self.ops_per_worker,
            self.ops.len()
        )
    }
}

/// Shape of the untimed warm-up run.
///
/// Every worker runs `iterations` iterations of every [`SlotOp`] against
/// both strategies. Missing the `timeout` is tolerated.
#[derive(Clone, Copy, Debug)]
pub struct WarmUp {
    pub workers: NonZeroUsize,
    pub iterations: u64,
    pub timeout: Duration,
}

impl WarmUp {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// 20 workers x 1000 iterations.
    pub fn high_concurrency() -> Self {
        Self {
            workers: non_zero(20),
            iterations: 1000,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// 10 workers x 1000 iterations.
    pub fn single_slot() -> Self {
        Self {
            workers: non_zero(10),
            iterations: 1000,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn plan(&self) -> IterationPlan {
        IterationPlan::new(&SlotOp::ALL, Some(DEFAULT_CLEAR_EVERY))
    }
}
