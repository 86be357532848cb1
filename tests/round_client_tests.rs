mod common;

use common::{BridgeCapture, MockTransport};
use psi_fog_app::application::RoundClient;
use psi_fog_app::domains::intersection::UnitInput;
use psi_fog_app::domains::logger::DomainLogger;
use psi_fog_app::{ApplicationError, RoundError};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_run_json_round() {
    let transport = Arc::new(MockTransport::new().reply_decrypted(&["2 2"]));
    let capture = Arc::new(BridgeCapture::new());
    let client = RoundClient::new(transport.clone(), capture.clone() as Arc<dyn DomainLogger>);

    let result = client
        .run_json(&[json!("2 2"), json!({"id": "u7", "x": 3, "y": 3})], &[json!({"unit": "2 2"})])
        .await
        .unwrap();

    assert_eq!(result.intersected[0].unit, "2 2");
    let calls = transport.calls();
    assert_eq!(calls[0].prover_set[0].id, "bob-0");
    assert_eq!(calls[0].prover_set[1].id, "u7");
    assert_eq!(calls[0].verifier_set[0].id, "alice-0");

    let msgs = capture.messages.lock().unwrap();
    assert!(msgs.iter().any(|m| m.starts_with("INFO:round completed")));
}

#[tokio::test]
async fn test_invalid_unit_fails_before_sending() {
    let transport = Arc::new(MockTransport::new());
    let client = RoundClient::new(transport.clone(), psi_fog_app::adapters::outbound::init_noop_logger());

    let err = client
        .run_once(&[UnitInput::Text("1 one".into())], &[UnitInput::Text("1 1".into())])
        .await
        .unwrap_err();

    assert!(matches!(err, ApplicationError::Domain(_)));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_failed_round_surfaces_round_error() {
    let transport = Arc::new(MockTransport::new().reply(Err(RoundError::Transport("refused".into()))));
    let client = RoundClient::new(transport, psi_fog_app::adapters::outbound::init_noop_logger());

    let err = client
        .run_once(&[UnitInput::Text("1 1".into())], &[UnitInput::Text("1 1".into())])
        .await
        .unwrap_err();

    assert!(matches!(err, ApplicationError::Round(RoundError::Transport(_))));
}

#[tokio::test]
async fn test_aborted_handle() {
    let (transport, _gate) = MockTransport::gated();
    let transport = Arc::new(transport);
    let client = RoundClient::new(transport.clone(), psi_fog_app::adapters::outbound::init_noop_logger());

    let handle = client
        .start(&[UnitInput::Text("1 1".into())], &[UnitInput::Text("1 1".into())])
        .unwrap();
    transport.wait_for_calls(1).await;
    handle.abort();

    assert_eq!(
        handle.settle().await,
        psi_fog_app::domains::intersection::RoundOutcome::Aborted
    );
}
