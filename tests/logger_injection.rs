mod common;

use common::{orchestrator, scenario_a, BridgeCapture, MockTransport, RecordingSink};
use psi_fog_app::adapters::outbound::{init_buffered_logger, init_noop_logger, MultiLogger};
use psi_fog_app::domains::intersection::RefinementOrchestrator;
use psi_fog_app::domains::logger::DomainLogger;
use psi_fog_app::RoundError;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_buffered_and_noop_logger() {
    let capture = Arc::new(BridgeCapture::new());
    let bridge = capture.clone() as Arc<dyn DomainLogger>;

    let buffered = init_buffered_logger(bridge, 8);
    buffered.info("one");
    buffered.warn("two");
    buffered.error("three");

    tokio::time::sleep(Duration::from_millis(50)).await;

    let msgs = capture.messages.lock().unwrap();
    assert!(msgs.iter().any(|m| m == "INFO:one"));
    assert!(msgs.iter().any(|m| m == "WARN:two"));
    assert!(msgs.iter().any(|m| m == "ERR:three"));

    let noop = init_noop_logger();
    noop.info("ignored");
    noop.error("ignored-err");
}

#[tokio::test]
async fn test_multi_logger_fans_out() {
    let first = Arc::new(BridgeCapture::new());
    let second = Arc::new(BridgeCapture::new());
    let multi = MultiLogger::new(first.clone(), Some(second.clone() as Arc<dyn DomainLogger>));

    multi.warn("stale results");

    assert_eq!(*first.messages.lock().unwrap(), vec!["WARN:stale results".to_string()]);
    assert_eq!(*second.messages.lock().unwrap(), vec!["WARN:stale results".to_string()]);
}

#[tokio::test]
async fn test_orchestrator_logs_through_injected_logger() {
    let capture = Arc::new(BridgeCapture::new());
    let transport = Arc::new(
        MockTransport::new()
            .reply_decrypted(&["1 1"])
            .reply(Err(RoundError::Transport("connection reset".into()))),
    );
    let orch = RefinementOrchestrator::new(
        common::default_settings(),
        transport,
        Arc::new(RecordingSink::default()),
        capture.clone(),
    );

    orch.run(scenario_a()).await.unwrap();

    let msgs = capture.messages.lock().unwrap();
    assert!(msgs.iter().any(|m| m.starts_with("INFO:") && m.contains("coarse round")));
    assert!(msgs.iter().any(|m| m.starts_with("INFO:") && m.contains("fine round")));
    assert!(msgs
        .iter()
        .any(|m| m.starts_with("ERR:") && m.contains("fine round failed") && m.contains("connection reset")));
}

#[tokio::test]
async fn test_noop_orchestrator_helper() {
    let orch = orchestrator(Arc::new(MockTransport::new()), Arc::new(RecordingSink::default()));
    assert!(orch.run(scenario_a()).await.is_ok());
}
