//! # Slotbench
//!
//! Compares two per-worker slot storage strategies under a highly concurrent
//! synthetic workload and prints which one is faster.
//!
//! The measurement machinery lives in [`slotbench_core`] and is re-exported
//! here. This crate adds what the entry-point binaries need on top of it:
//! logging setup, Ctrl-C wiring, and the console report.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use slotbench::{init_logging, install_ctrlc_handler, run_report, HarnessConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging();
//!     let interrupt = install_ctrlc_handler()?;
//!     let mut out = std::io::stdout().lock();
//!     run_report(&mut out, "Slot benchmark", HarnessConfig::high_concurrency(), interrupt)?;
//!     Ok(())
//! }
//! ```
//!
//! Diagnostics are written to stderr; set `RUST_LOG` (e.g. `RUST_LOG=debug`)
//! to see phase transitions and pool activity.

mod logging;
mod report;

pub use logging::{init_logging, DEFAULT_FILTER};
pub use report::{install_ctrlc_handler, run_report};

pub use slotbench_core::*;
