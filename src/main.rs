use psi_fog_app::adapters::inbound::BouncingField;
use psi_fog_app::adapters::outbound::{
    init_configured_logger, install_tracing_subscriber, HttpRoundTransport,
};
use psi_fog_app::application::VisibilityView;
use psi_fog_app::config::install_endpoint;
use psi_fog_app::domains::grid::{match_positions, GridSize, Position};
use psi_fog_app::Config;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const MOTION_PERIOD: Duration = Duration::from_millis(30);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    install_tracing_subscriber("info")?;

    info!("Starting PSI fog-of-war demo");

    let config = Config::load("psi-fog.toml")?;
    if let Some(url) = config.endpoint.url.clone() {
        install_endpoint(url);
    }
    info!(
        endpoint = %config.endpoint.resolve(),
        coarse = config.grid.coarse_size,
        fine = config.grid.fine_size,
        radius = config.grid.visibility_radius,
        "Configuration loaded"
    );

    let logger = init_configured_logger(&config.logging);
    let transport = Arc::new(HttpRoundTransport::new(&config.endpoint)?);

    let field = Arc::new(BouncingField::new(
        vec![
            Position::new("u1", 100.0, 100.0),
            Position::new("u2", 200.0, 200.0),
            Position::new("u3", 300.0, 300.0),
        ],
        vec![
            Position::new("v1", 150.0, 150.0),
            Position::new("v2", 350.0, 350.0),
        ],
    ));
    let shutdown = CancellationToken::new();
    let motion = field.spawn_motion(MOTION_PERIOD, shutdown.clone());

    let view = VisibilityView::launch(&config, transport, field.clone(), logger)?;
    let fine = GridSize::new(config.grid.fine_size)?;
    let mut updates = view.subscribe();
    view.activate();

    let reporter_shutdown = shutdown.clone();
    let reporter_field = field.clone();
    let reporter = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = reporter_shutdown.cancelled() => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let Some(publication) = updates.borrow_and_update().clone() else {
                        continue;
                    };
                    let movers = reporter_field.movers();
                    let cells = publication.result_cells();
                    let detected: Vec<&str> = match_positions(&cells, &movers, fine)
                        .into_iter()
                        .map(|p| p.id.as_str())
                        .collect();
                    match &publication.performance {
                        Some(perf) => info!(
                            status = %publication.status,
                            level = %perf.level,
                            total_ms = perf.timing.total_time,
                            detected = ?detected,
                            "PSI status"
                        ),
                        None => info!(status = %publication.status, detected = ?detected, "PSI status"),
                    }
                }
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutting down PSI fog-of-war demo");

    view.deactivate();
    view.shutdown().await;
    shutdown.cancel();
    if let Err(e) = motion.await {
        warn!("motion task ended abnormally: {e}");
    }
    let _ = reporter.await;

    Ok(())
}
