use std::fmt;
use std::time::Duration;

/// Result of one timed benchmark run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Measurement {
    /// Name of the measured strategy.
    pub strategy: &'static str,
    /// Wall-clock time from just before dispatch to just after the join.
    pub elapsed: Duration,
    /// Final value of the aggregate operation counter.
    pub operations: u64,
    pub workers_completed: usize,
    pub workers_expected: usize,
}

impl Measurement {
    /// Elapsed time as printed in reports, in milliseconds with microsecond
    /// precision.
    pub fn elapsed_ms(&self) -> ElapsedMs {
        ElapsedMs(self.elapsed.as_micros())
    }

    /// `true` when every worker finished.
    pub fn is_complete(&self) -> bool {
        self.workers_completed == self.workers_expected
    }
}

/// A duration rendered as milliseconds with three decimals, e.g. `100.900`.
///
/// Holds whole microseconds, the resolution [`Comparison`] works at, so a
/// printed time never disagrees with the verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ElapsedMs(u128);

impl ElapsedMs {
    pub fn as_micros(self) -> u128 {
        self.0
    }
}

impl fmt::Display for ElapsedMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.0 / 1000, self.0 % 1000)
    }
}

/// How the candidate strategy fared against the baseline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Faster,
    Slower,
    Equal,
}

/// Head-to-head comparison of two measurements.
///
/// `ratio` is `baseline time / candidate time`, so a ratio above 1 means the
/// candidate is faster. Durations are compared in whole microseconds, the
/// precision reports print them at. Two zero durations compare as equal with
/// ratio 1; otherwise a zero duration is clamped to 1 µs for the ratio, so no
/// division by zero can happen.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use slotbench_core::{Comparison, Verdict};
///
/// let cmp = Comparison::from_durations(
///     "ThreadLocalSlots",
///     Duration::from_millis(300),
///     "IndexedSlots",
///     Duration::from_millis(100),
/// );
/// assert_eq!(cmp.verdict(), Verdict::Faster);
/// assert!((cmp.ratio() - 3.0).abs() < 1e-9);
/// assert_eq!(cmp.to_string(), "IndexedSlots is 3.00x faster than ThreadLocalSlots");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Comparison {
    baseline: &'static str,
    candidate: &'static str,
    ratio: f64,
    verdict: Verdict,
}

impl Comparison {
    /// Compares `candidate` against `baseline`.
    pub fn between(baseline: &Measurement, candidate: &Measurement) -> Self {
        Self::from_durations(
            baseline.strategy,
            baseline.elapsed,
            candidate.strategy,
            candidate.elapsed,
        )
    }

    pub fn from_durations(
        baseline: &'static str,
        baseline_time: Duration,
        candidate: &'static str,
        candidate_time: Duration,
    ) -> Self {
        let a = baseline_time.as_micros();
        let b = candidate_time.as_micros();

        if a == 0 && b == 0 {
            return Self {
                baseline,
                candidate,
                ratio: 1.0,
                verdict: Verdict::Equal,
            };
        }

        let verdict = match a.cmp(&b) {
            std::cmp::Ordering::Greater => Verdict::Faster,
            std::cmp::Ordering::Less => Verdict::Slower,
            std::cmp::Ordering::Equal => Verdict::Equal,
        };

        Self {
            baseline,
            candidate,
            ratio: a.max(1) as f64 / b.max(1) as f64,
            verdict,
        }
    }

    pub fn baseline(&self) -> &'static str {
        self.baseline
    }

    pub fn candidate(&self) -> &'static str {
        self.candidate
    }

    /// Baseline time divided by candidate time.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Multiplicative factor printed in the report, always >= 1.
    pub fn factor(&self) -> f64 {
        if self.ratio >= 1.0 {
            self.ratio
        } else {
            1.0 / self.ratio
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.verdict {
            Verdict::Faster => write!(
                f,
                "{} is {:.2}x faster than {}",
                self.candidate,
                self.factor(),
                self.baseline
            ),
            Verdict::Slower => write!(
                f,
                "{} is {:.2}x slower than {}",
                self.candidate,
                self.factor(),
                self.baseline
            ),
            Verdict::Equal => write!(f, "{} is as fast as {}", self.candidate, self.baseline),
        }
    }
}
