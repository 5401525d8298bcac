use std::io;

use thiserror::Error;

use crate::harness::Phase;
use crate::WorkerId;

/// Errors surfaced by the benchmark harness.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("harness operation requires phase {expected}, but the harness is {actual}")]
    OutOfOrder { expected: Phase, actual: Phase },

    #[error("failed to spawn {worker}")]
    Spawn {
        worker: WorkerId,
        #[source]
        source: io::Error,
    },

    #[error(
        "{phase}: only {completed} of {expected} workers finished within the join timeout \
         ({operations} operations counted)"
    )]
    WorkersTimedOut {
        phase: Phase,
        completed: usize,
        expected: usize,
        operations: u64,
    },

    #[error("{worker} panicked")]
    WorkerPanicked { worker: WorkerId },

    #[error("interrupted while waiting for workers")]
    Interrupted,

    #[error("invalid workload: {0}")]
    InvalidWorkload(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_reports_counts() {
        let err = BenchError::WorkersTimedOut {
            phase: Phase::BenchmarkingA,
            completed: 3,
            expected: 10,
            operations: 300,
        };
        let msg = err.to_string();
        assert!(msg.contains("3 of 10"));
        assert!(msg.contains("300 operations"));
    }

    #[test]
    fn test_spawn_error_keeps_source() {
        use std::error::Error as _;

        let err = BenchError::Spawn {
            worker: WorkerId::new(7),
            source: io::Error::new(io::ErrorKind::Other, "no threads left"),
        };
        assert_eq!(err.to_string(), "failed to spawn worker-7");
        assert!(err.source().is_some());
    }
}
