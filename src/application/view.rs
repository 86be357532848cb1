use super::scheduler::{SchedulerControl, SchedulerSettings, ViewScheduler};
use crate::adapters::outbound::WatchStatusSink;
use crate::common::DomainResult;
use crate::config::Config;
use crate::domains::intersection::{
    PositionSource, RefinementOrchestrator, RefinementSettings, RoundPublication, RoundTransport,
};
use crate::domains::logger::DynLogger;
use std::sync::Arc;
use tokio::sync::watch;

/// One visibility view: an orchestrator, its scheduler and the latest
/// publication, wired from a [`Config`].
pub struct VisibilityView {
    orchestrator: Arc<RefinementOrchestrator>,
    status: Arc<WatchStatusSink>,
    control: SchedulerControl,
}

impl VisibilityView {
    /// Validate the grid settings and spawn an inactive scheduler.
    pub fn launch(
        config: &Config,
        transport: Arc<dyn RoundTransport>,
        source: Arc<dyn PositionSource>,
        logger: DynLogger,
    ) -> DomainResult<Self> {
        let settings = RefinementSettings::from_config(&config.grid)?;
        let status = Arc::new(WatchStatusSink::new());
        let orchestrator = Arc::new(RefinementOrchestrator::new(
            settings,
            transport,
            status.clone(),
            logger.clone(),
        ));
        let control = ViewScheduler::new(
            Arc::clone(&orchestrator),
            source,
            SchedulerSettings::from_config(&config.scheduler),
            logger,
        )
        .spawn();

        Ok(Self {
            orchestrator,
            status,
            control,
        })
    }

    pub fn orchestrator(&self) -> &Arc<RefinementOrchestrator> {
        &self.orchestrator
    }

    pub fn control(&self) -> &SchedulerControl {
        &self.control
    }

    pub fn activate(&self) {
        self.control.activate();
    }

    pub fn deactivate(&self) {
        self.control.deactivate();
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<RoundPublication>> {
        self.status.subscribe()
    }

    pub fn latest(&self) -> Option<RoundPublication> {
        self.status.latest()
    }

    pub async fn shutdown(self) {
        self.control.shutdown().await;
    }
}
