use crate::domains::intersection::{RoundPublication, StatusSink};
use tokio::sync::watch;

/// Keeps only the latest publication; readers subscribe to changes.
pub struct WatchStatusSink {
    tx: watch::Sender<Option<RoundPublication>>,
}

impl WatchStatusSink {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<RoundPublication>> {
        self.tx.subscribe()
    }

    pub fn latest(&self) -> Option<RoundPublication> {
        self.tx.borrow().clone()
    }
}

impl Default for WatchStatusSink {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSink for WatchStatusSink {
    fn publish(&self, publication: &RoundPublication) {
        self.tx.send_replace(Some(publication.clone()));
    }
}
