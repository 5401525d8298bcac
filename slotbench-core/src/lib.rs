//! # Slotbench Core
//!
//! A harness for timing per-worker cached values ("slots") under heavy
//! concurrency.
//!
//! Many workers each keep their own private copy of a small set of typed
//! values. The harness compares two ways of storing those copies:
//!
//! - **Strategy A**, [`ThreadLocalSlots`]: a general-purpose store keyed by
//!   slot id in a `thread_local!` hash map.
//! - **Strategy B**, [`IndexedSlots`]: a per-worker vector indexed directly
//!   by the slot's dense index.
//!
//! ## Module Organization
//!
//! - [`slot`] - slot declarations and the standard five-slot set
//! - [`strategy`] - the [`SlotStrategy`] / [`SlotAccess`] seam and both strategies
//! - [`workload`] - what each worker does per iteration
//! - [`harness`] - warm-up, timed runs, and comparison in lifecycle order
//!
//! The remaining modules are the concurrency plumbing under the harness: a
//! fixed pool of named threads, a countdown latch, an atomic operation
//! counter, and a cooperative interrupt token.
//!
//! ## Logging
//!
//! The crate logs through [`tracing`] and never installs a subscriber.
//! Phase changes and finished runs are logged at `info`, pool internals at
//! `debug`, and tolerated anomalies (warm-up timeouts, interrupts) at `warn`.

mod counter;
mod error;
mod interrupt;
mod latch;
mod measurement;
mod pool;

pub mod harness;
pub mod slot;
pub mod strategy;
pub mod workload;

pub use counter::OperationCounter;
pub use error::BenchError;
pub use harness::{measure, Harness, HarnessConfig, Phase, Report, WarmUpOutcome};
pub use interrupt::{Interrupt, Interrupted};
pub use latch::{CountDownLatch, LatchGuard};
pub use measurement::{Comparison, ElapsedMs, Measurement, Verdict};
pub use pool::{Dispatch, FixedPool, WorkerId};
pub use slot::{Slot, SlotId, SlotRegistry, SlotSet, SlotValue};
pub use strategy::{
    IndexedContext, IndexedSlots, SlotAccess, SlotStrategy, ThreadLocalContext, ThreadLocalSlots,
};
pub use workload::{IterationPlan, SlotOp, WarmUp, Workload};
