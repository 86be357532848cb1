use crate::domains::logger::{DomainLogger, FileLogger};
use std::sync::Arc;

/// Install the `fast_log` backend writing to `path` at `level` and return
/// the timestamped [`FileLogger`] for injection.
///
/// Fails when another `log` backend already owns the facade in this process.
pub fn init_file_logger(path: &str, level: &str) -> Result<Arc<dyn DomainLogger>, String> {
    FileLogger::init(path, level)
        .map_err(|e| format!("Failed to initialize fast_log at {path}: {e}"))?;
    Ok(Arc::new(FileLogger))
}
