use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static LOGGER_ONCE: OnceLock<()> = OnceLock::new();
const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper=warn";

/// Installs the global tracing subscriber (idempotent, safe to call repeatedly).
///
/// `RUST_LOG` overrides the default filter. A subscriber installed elsewhere
/// first is left in place.
pub fn init_logging() {
    LOGGER_ONCE.get_or_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_filter(env_filter);

        if tracing_subscriber::registry().with(fmt_layer).try_init().is_err() {
            eprintln!("tracing subscriber already installed; keeping the existing one");
        }
    });
}
