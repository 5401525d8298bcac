//! Integration tests for the full measurement protocol

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serial_test::serial;
use slotbench::{
    BenchError, Harness, HarnessConfig, IndexedSlots, Phase, SlotOp, ThreadLocalSlots, Verdict,
    WarmUp, Workload,
};

fn config(workers: usize, ops_per_worker: u64, ops: &[SlotOp]) -> HarnessConfig {
    let workers = NonZeroUsize::new(workers).unwrap();
    HarnessConfig::new(
        WarmUp {
            workers,
            iterations: 20,
            timeout: WarmUp::DEFAULT_TIMEOUT,
        },
        Workload::new(workers, ops_per_worker).with_ops(ops),
    )
}

fn strategies(harness: &Harness) -> (Arc<ThreadLocalSlots>, Arc<IndexedSlots>) {
    (
        Arc::new(ThreadLocalSlots::new()),
        Arc::new(IndexedSlots::new(harness.registry())),
    )
}

#[test]
#[serial]
fn test_end_to_end_number_workload() {
    let start = Instant::now();
    let harness = Harness::new(config(10, 100, &[SlotOp::WriteNumber, SlotOp::ReadNumber])).unwrap();
    let (a, b) = strategies(&harness);

    let report = harness.run(&a, &b).unwrap();

    assert_eq!(report.baseline.operations, 1000);
    assert_eq!(report.candidate.operations, 1000);
    assert!(report.baseline.is_complete());
    assert!(report.candidate.is_complete());
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[test]
#[serial]
fn test_counter_is_exact_for_every_run() {
    for _ in 0..3 {
        let harness = Harness::new(config(16, 250, &SlotOp::ALL)).unwrap();
        let (a, b) = strategies(&harness);
        let report = harness.run(&a, &b).unwrap();
        assert_eq!(report.baseline.operations, 16 * 250);
        assert_eq!(report.candidate.operations, 16 * 250);
    }
}

#[test]
#[serial]
fn test_single_worker_single_op() {
    let harness = Harness::new(config(1, 1, &SlotOp::ALL)).unwrap();
    let (a, b) = strategies(&harness);
    let report = harness.run(&a, &b).unwrap();

    assert_eq!(report.baseline.operations, 1);
    assert_eq!(report.candidate.operations, 1);
    assert!(report.comparison.ratio().is_finite());
}

#[test]
#[serial]
fn test_ratio_matches_measurements() {
    let harness = Harness::new(config(4, 500, &SlotOp::ALL)).unwrap();
    let (a, b) = strategies(&harness);
    let report = harness.run(&a, &b).unwrap();

    let time_a = report.baseline.elapsed.as_nanos().max(1) as f64;
    let time_b = report.candidate.elapsed.as_nanos().max(1) as f64;
    assert!((report.comparison.ratio() - time_a / time_b).abs() < 1e-9);

    let expected = match report.baseline.elapsed.cmp(&report.candidate.elapsed) {
        std::cmp::Ordering::Greater => Verdict::Faster,
        std::cmp::Ordering::Less => Verdict::Slower,
        std::cmp::Ordering::Equal => Verdict::Equal,
    };
    assert_eq!(report.comparison.verdict(), expected);
    assert_eq!(report.comparison.baseline(), ThreadLocalSlots::NAME);
    assert_eq!(report.comparison.candidate(), IndexedSlots::NAME);
}

#[test]
#[serial]
fn test_warm_up_with_high_concurrency_preset() {
    let mut harness = Harness::new(HarnessConfig::high_concurrency()).unwrap();
    let (a, b) = strategies(&harness);

    let outcome = harness.warm_up(&a, &b).unwrap();
    assert_eq!(outcome.workers_expected, 20);
    assert_eq!(harness.phase(), Phase::WarmingUp);
}

#[test]
#[serial]
fn test_benchmark_timeout_reports_partial_completion() {
    let workers = NonZeroUsize::new(4).unwrap();
    let config = HarnessConfig::new(
        WarmUp {
            workers,
            iterations: 1,
            timeout: WarmUp::DEFAULT_TIMEOUT,
        },
        Workload::new(workers, u64::MAX).with_join_timeout(Duration::from_millis(20)),
    );
    let mut harness = Harness::new(config).unwrap();
    let (a, b) = strategies(&harness);
    harness.warm_up(&a, &b).unwrap();

    match harness.benchmark(&a) {
        Err(BenchError::WorkersTimedOut {
            phase,
            completed,
            expected,
            operations,
        }) => {
            assert_eq!(phase, Phase::BenchmarkingA);
            assert_eq!(expected, 4);
            assert!(completed < expected);
            assert!(operations < u64::MAX);
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
}

#[test]
fn test_out_of_order_compare() {
    let mut harness = Harness::new(config(1, 1, &[SlotOp::ReadNumber])).unwrap();
    let (a, b) = strategies(&harness);
    harness.warm_up(&a, &b).unwrap();
    let m = harness.benchmark(&a).unwrap();

    let err = harness.compare_and_report(&m, &m).unwrap_err();
    assert_eq!(
        err.to_string(),
        "harness operation requires phase benchmarking B, but the harness is benchmarking A"
    );
}
