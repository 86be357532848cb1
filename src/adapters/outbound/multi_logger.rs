use crate::domains::logger::DomainLogger;
use std::sync::Arc;

/// Fans every message out to a primary and an optional secondary logger.
pub struct MultiLogger {
    primary: Arc<dyn DomainLogger>,
    secondary: Option<Arc<dyn DomainLogger>>,
}

impl MultiLogger {
    pub fn new(primary: Arc<dyn DomainLogger>, secondary: Option<Arc<dyn DomainLogger>>) -> Self {
        Self { primary, secondary }
    }
}

impl DomainLogger for MultiLogger {
    fn info(&self, msg: &str) {
        self.primary.info(msg);
        if let Some(sec) = &self.secondary {
            sec.info(msg);
        }
    }

    fn warn(&self, msg: &str) {
        self.primary.warn(msg);
        if let Some(sec) = &self.secondary {
            sec.warn(msg);
        }
    }

    fn error(&self, msg: &str) {
        self.primary.error(msg);
        if let Some(sec) = &self.secondary {
            sec.error(msg);
        }
    }
}

/// Logger for the configured [`LoggingConfig`](crate::config::LoggingConfig):
/// `tracing` always, plus a `fast_log` file when `file` is set and the file
/// backend could be installed.
pub fn init_configured_logger(logging: &crate::config::LoggingConfig) -> Arc<dyn DomainLogger> {
    let base = super::init_tracing_logger();
    let Some(path) = logging.file.as_deref() else {
        return base;
    };
    match super::init_file_logger(path, &logging.level) {
        Ok(file) => Arc::new(MultiLogger::new(base, Some(file))),
        Err(e) => {
            base.warn(&format!("file logging disabled: {e}"));
            base
        }
    }
}
