use once_cell::sync::OnceCell;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "warn";

static LOGGING: OnceCell<()> = OnceCell::new();

/// Installs a stderr `tracing` subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; only the first call has an effect. If some
/// other subscriber is already installed it is left in place.
pub fn init_logging() {
    LOGGING.get_or_init(|| {
        let filter = std::env::var("RUST_LOG")
            .ok()
            .and_then(|expr| EnvFilter::try_new(expr).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

        let _ = fmt()
            .with_writer(std::io::stderr)
            .with_thread_names(true)
            .with_env_filter(filter)
            .try_init();
    });
}
