//! Read / write / periodic clear on a single text slot.

use slotbench::{init_logging, install_ctrlc_handler, run_report, HarnessConfig};

fn main() -> anyhow::Result<()> {
    init_logging();
    let interrupt = install_ctrlc_handler()?;

    let mut out = std::io::stdout().lock();
    run_report(
        &mut out,
        "ThreadLocalSlots vs IndexedSlots Performance Comparison",
        HarnessConfig::single_slot(),
        interrupt,
    )?;
    Ok(())
}
