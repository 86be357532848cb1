use crate::domains::logger::DomainLogger;
use std::sync::Arc;

/// Every level goes to stderr, so a command's report on stdout stays clean.
struct ConsoleBridge {
    prefix: &'static str,
}

impl DomainLogger for ConsoleBridge {
    fn info(&self, msg: &str) {
        eprintln!("[{}] {}", self.prefix, msg);
    }
    fn warn(&self, msg: &str) {
        eprintln!("[{}] WARN: {}", self.prefix, msg);
    }
    fn error(&self, msg: &str) {
        eprintln!("[{}] ERROR: {}", self.prefix, msg);
    }
}

/// Console logger for command-line tools, tagged with the tool's name.
pub fn init_console_logger(prefix: &'static str) -> Arc<dyn DomainLogger> {
    Arc::new(ConsoleBridge { prefix })
}
