//! High-concurrency comparison over all five slots.
//!
//! Run with `cargo run --release --bin slot_benchmark`.

use slotbench::{init_logging, install_ctrlc_handler, run_report, HarnessConfig};

fn main() -> anyhow::Result<()> {
    init_logging();
    let interrupt = install_ctrlc_handler()?;

    let mut out = std::io::stdout().lock();
    run_report(
        &mut out,
        "High Concurrency ThreadLocalSlots vs IndexedSlots Benchmark",
        HarnessConfig::high_concurrency(),
        interrupt,
    )?;
    Ok(())
}
