use crate::domains::logger::DomainLogger;
use std::sync::Arc;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;

struct TracingBridge;

impl DomainLogger for TracingBridge {
    fn info(&self, msg: &str) {
        tracing::info!(target: "psi_fog", "{}", msg);
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(target: "psi_fog", "{}", msg);
    }

    fn error(&self, msg: &str) {
        tracing::error!(target: "psi_fog", "{}", msg);
    }
}

/// Domain logger forwarding to whatever `tracing` subscriber is installed.
pub fn init_tracing_logger() -> Arc<dyn DomainLogger> {
    Arc::new(TracingBridge)
}

/// Install the global `fmt` subscriber filtered by `RUST_LOG`, or by
/// `default_filter` when that is unset.
///
/// The `log` facade is left alone, so the `fast_log` file backend can still
/// be installed afterwards.
pub fn install_tracing_subscriber(default_filter: &str) -> Result<(), SetGlobalDefaultError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
}
