use crate::domains::logger::DomainLogger;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy)]
enum Severity {
    Info,
    Warn,
    Error,
}

struct Entry {
    severity: Severity,
    text: String,
}

struct BufferedLogger {
    sender: mpsc::Sender<Entry>,
}

impl BufferedLogger {
    fn push(&self, severity: Severity, msg: &str) {
        // Never block a round on logging; drop when the buffer is full.
        let _ = self.sender.try_send(Entry {
            severity,
            text: msg.to_string(),
        });
    }
}

impl DomainLogger for BufferedLogger {
    fn info(&self, msg: &str) {
        self.push(Severity::Info, msg);
    }

    fn warn(&self, msg: &str) {
        self.push(Severity::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.push(Severity::Error, msg);
    }
}

/// Decouple callers from a slow `sink`: messages are queued (up to
/// `capacity`) and forwarded by a background task. Must be called inside a
/// Tokio runtime.
pub fn init_buffered_logger(sink: Arc<dyn DomainLogger>, capacity: usize) -> Arc<dyn DomainLogger> {
    let (sender, mut rx) = mpsc::channel::<Entry>(capacity.max(1));

    tokio::spawn(async move {
        while let Some(entry) = rx.recv().await {
            match entry.severity {
                Severity::Info => sink.info(&entry.text),
                Severity::Warn => sink.warn(&entry.text),
                Severity::Error => sink.error(&entry.text),
            }
        }
    });

    Arc::new(BufferedLogger { sender })
}
