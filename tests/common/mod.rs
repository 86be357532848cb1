#![allow(dead_code)]

use async_trait::async_trait;
use psi_fog_app::domains::intersection::{
    PositionSnapshot, RefinementOrchestrator, RefinementSettings, RoundPublication, RoundRequest,
    RoundTransport, StatusSink, WireResponse,
};
use psi_fog_app::domains::grid::Position;
use psi_fog_app::domains::logger::DomainLogger;
use psi_fog_app::RoundError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, Semaphore};

/// Scripted transport: replies are served in order, every request is recorded.
/// With a gate, each exchange waits for one permit before replying.
pub struct MockTransport {
    replies: Mutex<VecDeque<Result<WireResponse, RoundError>>>,
    calls: Mutex<Vec<RoundRequest>>,
    gate: Option<Arc<Semaphore>>,
    called: Notify,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            gate: None,
            called: Notify::new(),
        }
    }

    /// Replies are held until [`Semaphore::add_permits`] is called on the gate.
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let mut transport = Self::new();
        transport.gate = Some(gate.clone());
        (transport, gate)
    }

    pub fn reply(self, reply: Result<WireResponse, RoundError>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn reply_decrypted(self, units: &[&str]) -> Self {
        self.reply(Ok(WireResponse::with_decrypted(units.iter().copied())))
    }

    pub fn calls(&self) -> Vec<RoundRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub async fn wait_for_calls(&self, n: usize) {
        loop {
            let notified = self.called.notified();
            if self.call_count() >= n {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl RoundTransport for MockTransport {
    async fn exchange(&self, request: &RoundRequest) -> Result<WireResponse, RoundError> {
        self.calls.lock().unwrap().push(request.clone());
        self.called.notify_waiters();
        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.unwrap();
            permit.forget();
        }
        // Unscripted rounds find nothing.
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(WireResponse::default()))
    }
}

/// Records every publication in order.
#[derive(Default)]
pub struct RecordingSink {
    publications: Mutex<Vec<RoundPublication>>,
}

impl RecordingSink {
    pub fn publications(&self) -> Vec<RoundPublication> {
        self.publications.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<RoundPublication> {
        self.publications.lock().unwrap().last().cloned()
    }
}

impl StatusSink for RecordingSink {
    fn publish(&self, publication: &RoundPublication) {
        self.publications.lock().unwrap().push(publication.clone());
    }
}

pub struct BridgeCapture {
    pub messages: Arc<Mutex<Vec<String>>>,
}

impl BridgeCapture {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl DomainLogger for BridgeCapture {
    fn info(&self, msg: &str) {
        self.messages.lock().unwrap().push(format!("INFO:{}", msg));
    }
    fn warn(&self, msg: &str) {
        self.messages.lock().unwrap().push(format!("WARN:{}", msg));
    }
    fn error(&self, msg: &str) {
        self.messages.lock().unwrap().push(format!("ERR:{}", msg));
    }
}

pub fn default_settings() -> RefinementSettings {
    RefinementSettings::new(100.0, 50.0, 70.0).unwrap()
}

pub fn orchestrator(transport: Arc<MockTransport>, sink: Arc<RecordingSink>) -> RefinementOrchestrator {
    RefinementOrchestrator::new(
        default_settings(),
        transport,
        sink,
        psi_fog_app::adapters::outbound::init_noop_logger(),
    )
}

/// One mover at (100,100), one watcher at (150,150).
pub fn scenario_a() -> PositionSnapshot {
    PositionSnapshot::new(
        vec![Position::new("u1", 100.0, 100.0)],
        vec![Position::new("v1", 150.0, 150.0)],
    )
}
