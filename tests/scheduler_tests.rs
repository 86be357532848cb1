mod common;

use common::{orchestrator, scenario_a, MockTransport, RecordingSink};
use psi_fog_app::adapters::inbound::StaticPositions;
use psi_fog_app::adapters::outbound::{init_noop_logger, WatchStatusSink};
use psi_fog_app::application::{SchedulerSettings, ViewScheduler, VisibilityView};
use psi_fog_app::domains::intersection::{IntersectedUnit, PositionSource, RoundState};
use psi_fog_app::Config;
use std::sync::Arc;
use std::time::Duration;

fn source() -> Arc<dyn PositionSource> {
    let snapshot = scenario_a();
    Arc::new(StaticPositions::new(snapshot.movers, snapshot.watchers))
}

fn settings(period_ms: u64, min_interval_ms: u64) -> SchedulerSettings {
    SchedulerSettings {
        period: Duration::from_millis(period_ms),
        min_interval: Duration::from_millis(min_interval_ms),
    }
}

#[tokio::test(start_paused = true)]
async fn test_active_view_runs_every_period() {
    let transport = Arc::new(MockTransport::new());
    let orch = Arc::new(orchestrator(transport.clone(), Arc::new(RecordingSink::default())));
    let control = ViewScheduler::new(orch, source(), settings(1000, 500), init_noop_logger()).spawn();

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(transport.call_count(), 0);
    assert!(!control.is_active());

    control.activate();
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(transport.call_count(), 3);

    control.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_no_run_while_processing() {
    let (transport, gate) = MockTransport::gated();
    let transport = Arc::new(transport);
    let orch = Arc::new(orchestrator(transport.clone(), Arc::new(RecordingSink::default())));
    let control = ViewScheduler::new(orch.clone(), source(), settings(1000, 500), init_noop_logger()).spawn();

    control.activate();
    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(transport.call_count(), 1);
    assert_eq!(orch.state(), RoundState::ProcessingCoarse);

    gate.add_permits(1);
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(transport.call_count(), 2);

    control.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_nudges_are_debounced() {
    let transport = Arc::new(MockTransport::new());
    let orch = Arc::new(orchestrator(transport.clone(), Arc::new(RecordingSink::default())));
    let control = ViewScheduler::new(orch, source(), settings(10_000, 500), init_noop_logger()).spawn();

    control.activate();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(transport.call_count(), 1);

    for _ in 0..5 {
        control.nudge();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(transport.call_count(), 1);

    tokio::time::sleep(Duration::from_millis(500)).await;
    control.nudge();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(transport.call_count(), 2);

    control.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_deactivation_tears_down_and_stops_ticking() {
    let (transport, _gate) = MockTransport::gated();
    let transport = Arc::new(transport);
    let sink = Arc::new(RecordingSink::default());
    let orch = Arc::new(orchestrator(transport.clone(), sink.clone()));
    let control = ViewScheduler::new(orch.clone(), source(), settings(1000, 500), init_noop_logger()).spawn();

    control.activate();
    transport.wait_for_calls(1).await;
    assert!(orch.has_active_round());

    control.deactivate();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(orch.state(), RoundState::Idle);
    assert!(!orch.has_active_round());
    assert_eq!(sink.last().unwrap().status, RoundState::Idle);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(transport.call_count(), 1);

    control.activate();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(transport.call_count(), 2);

    control.shutdown().await;
}

#[tokio::test]
async fn test_view_publishes_refined_results() {
    let transport = Arc::new(MockTransport::new().reply_decrypted(&["1 1"]).reply_decrypted(&["2 2"]));
    let view = VisibilityView::launch(&Config::default(), transport, source(), init_noop_logger()).unwrap();
    let mut updates = view.subscribe();
    view.activate();

    let publication = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            updates.changed().await.unwrap();
            let latest = updates.borrow_and_update().clone();
            if let Some(p) = latest {
                if p.status == RoundState::Idle && !p.results.is_empty() {
                    return p;
                }
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(publication.results, vec![IntersectedUnit::new("2 2")]);
    assert_eq!(view.orchestrator().id(), publication.orchestrator_id);

    view.deactivate();
    view.shutdown().await;
}

#[test]
fn test_watch_sink_starts_empty() {
    let sink = WatchStatusSink::new();
    assert!(sink.latest().is_none());
}
