use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use slotbench_core::{
    Harness, HarnessConfig, IndexedSlots, Interrupt, Measurement, Report, SlotStrategy,
    ThreadLocalSlots,
};

/// Routes Ctrl-C to a fresh interrupt token and returns it.
///
/// Can only be installed once per process.
pub fn install_ctrlc_handler() -> anyhow::Result<Interrupt> {
    let interrupt = Interrupt::new();
    ctrlc::set_handler({
        let interrupt = interrupt.clone();
        move || {
            info!("ctrl-c, interrupting harness");
            interrupt.interrupt();
        }
    })
    .context("failed to install the Ctrl-C handler")?;
    Ok(interrupt)
}

/// Runs the full protocol with [`ThreadLocalSlots`] as strategy A and
/// [`IndexedSlots`] as strategy B, printing the console report to `out`.
pub fn run_report<W: Write>(
    out: &mut W,
    title: &str,
    config: HarnessConfig,
    interrupt: Interrupt,
) -> anyhow::Result<Report> {
    let mut harness = Harness::new(config)
        .context("invalid harness configuration")?
        .with_interrupt(interrupt);
    let general = Arc::new(ThreadLocalSlots::new());
    let optimized = Arc::new(IndexedSlots::new(harness.registry()));

    writeln!(out, "{title}")?;
    writeln!(out, "{}", "=".repeat(title.len()))?;
    writeln!(out, "{}", harness.config().workload)?;

    writeln!(out, "Warming up...")?;
    let warm_up = harness.warm_up(&general, &optimized)?;
    if warm_up.is_complete() {
        writeln!(out, "Warm up completed.")?;
    } else {
        writeln!(
            out,
            "Warm up ended early: {} of {} workers finished.",
            warm_up.workers_completed, warm_up.workers_expected
        )?;
    }

    writeln!(out, "\n1. Testing {}:", general.name())?;
    let baseline = harness
        .benchmark(&general)
        .with_context(|| format!("benchmark of {} failed", ThreadLocalSlots::NAME))?;
    print_measurement(out, &baseline)?;

    writeln!(out, "\n2. Testing {}:", optimized.name())?;
    let candidate = harness
        .benchmark(&optimized)
        .with_context(|| format!("benchmark of {} failed", IndexedSlots::NAME))?;
    print_measurement(out, &candidate)?;

    writeln!(out, "\n3. Performance Comparison:")?;
    let comparison = harness.compare_and_report(&baseline, &candidate)?;
    writeln!(out, "{comparison}")?;
    out.flush()?;

    Ok(Report {
        warm_up,
        baseline,
        candidate,
        comparison,
    })
}

fn print_measurement<W: Write>(out: &mut W, measurement: &Measurement) -> std::io::Result<()> {
    writeln!(
        out,
        "Total operations with {}: {}",
        measurement.strategy, measurement.operations
    )?;
    writeln!(
        out,
        "{} completed in: {} ms",
        measurement.strategy,
        measurement.elapsed_ms()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotbench_core::{Comparison, SlotOp, Verdict, WarmUp, Workload};
    use std::num::NonZeroUsize;
    use std::time::Duration;

    #[test]
    fn test_report_lines() {
        let workers = NonZeroUsize::new(2).unwrap();
        let config = HarnessConfig::new(
            WarmUp {
                workers,
                iterations: 5,
                timeout: Duration::from_secs(5),
            },
            Workload::new(workers, 10).with_ops(&[SlotOp::WriteNumber, SlotOp::ReadNumber]),
        );

        let mut out = Vec::new();
        let report = run_report(&mut out, "Test run", config, Interrupt::new()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Test run\n========\n"));
        assert!(text.contains("Warm up completed."));
        assert!(text.contains("Total operations with ThreadLocalSlots: 20"));
        assert!(text.contains("Total operations with IndexedSlots: 20"));
        assert!(text.contains("ThreadLocalSlots completed in: "));
        assert!(text.contains("IndexedSlots completed in: "));
        assert!(text.trim_end().ends_with(&report.comparison.to_string()));
    }

    #[test]
    fn test_interrupted_run_fails() {
        let workers = NonZeroUsize::new(1).unwrap();
        let config = HarnessConfig::new(
            WarmUp {
                workers,
                iterations: 1,
                timeout: Duration::from_secs(5),
            },
            Workload::new(workers, u64::MAX),
        );
        let interrupt = Interrupt::new();
        interrupt.interrupt();

        let mut out = Vec::new();
        let err = run_report(&mut out, "Interrupted", config, interrupt).unwrap_err();
        assert!(err.to_string().contains("benchmark of ThreadLocalSlots failed"));
    }

    fn timed(strategy: &'static str, nanos: u64) -> Measurement {
        Measurement {
            strategy,
            elapsed: Duration::from_nanos(nanos),
            operations: 1,
            workers_completed: 1,
            workers_expected: 1,
        }
    }

    fn printed_ms(text: &str) -> Vec<f64> {
        text.lines()
            .filter_map(|line| line.split(" completed in: ").nth(1))
            .map(|t| t.trim_end_matches(" ms").parse().unwrap())
            .collect()
    }

    #[test]
    fn test_printed_times_agree_with_verdict() {
        let cases = [
            (100_100_000, 100_900_000),
            (100_000_100, 100_000_900),
            (2_000_000, 1_999_999),
            (1_000, 0),
            (0, 0),
        ];
        for (a_nanos, b_nanos) in cases {
            let a = timed(ThreadLocalSlots::NAME, a_nanos);
            let b = timed(IndexedSlots::NAME, b_nanos);

            let mut out = Vec::new();
            print_measurement(&mut out, &a).unwrap();
            print_measurement(&mut out, &b).unwrap();
            let text = String::from_utf8(out).unwrap();
            let printed = printed_ms(&text);
            assert_eq!(printed.len(), 2, "{text}");

            let expected = match printed[0].partial_cmp(&printed[1]).unwrap() {
                std::cmp::Ordering::Greater => Verdict::Faster,
                std::cmp::Ordering::Less => Verdict::Slower,
                std::cmp::Ordering::Equal => Verdict::Equal,
            };
            assert_eq!(Comparison::between(&a, &b).verdict(), expected, "{text}");
        }
    }

    #[test]
    fn test_close_times_are_printed_apart() {
        let mut out = Vec::new();
        print_measurement(&mut out, &timed("A", 100_100_000)).unwrap();
        print_measurement(&mut out, &timed("B", 100_900_000)).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("A completed in: 100.100 ms"));
        assert!(text.contains("B completed in: 100.900 ms"));
    }
}
