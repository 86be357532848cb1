//! Periodic driver for one [`RefinementOrchestrator`].
//!
//! The loop sleeps while its view is inactive. Once activated it ticks at
//! `period` and starts a run only when the orchestrator accepts one and at
//! least `min_interval` has passed since the last start. Deactivation stops
//! the ticker and tears the orchestrator down.

use crate::config::SchedulerConfig;
use crate::domains::intersection::{PositionSource, RefinementOrchestrator};
use crate::domains::logger::DynLogger;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub period: Duration,
    /// Minimum time between two run starts, whatever triggered them.
    pub min_interval: Duration,
}

impl SchedulerSettings {
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            period: Duration::from_millis(config.period_ms.max(1)),
            min_interval: Duration::from_millis(config.min_interval_ms),
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self::from_config(&SchedulerConfig::default())
    }
}

pub struct ViewScheduler {
    orchestrator: Arc<RefinementOrchestrator>,
    source: Arc<dyn PositionSource>,
    settings: SchedulerSettings,
    logger: DynLogger,
}

/// Handle to a spawned [`ViewScheduler`]. The view starts inactive.
pub struct SchedulerControl {
    activity: watch::Sender<bool>,
    nudge: Arc<Notify>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl SchedulerControl {
    pub fn activate(&self) {
        self.activity.send_replace(true);
    }

    /// Stop ticking and tear the orchestrator down.
    pub fn deactivate(&self) {
        self.activity.send_replace(false);
    }

    pub fn is_active(&self) -> bool {
        *self.activity.borrow()
    }

    /// Request a run outside the regular cadence, e.g. after positions
    /// changed. Still subject to the debounce and the state gate.
    pub fn nudge(&self) {
        self.nudge.notify_one();
    }

    /// Stop the loop for good and wait for it to exit.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        let _ = self.task.await;
    }
}

impl ViewScheduler {
    pub fn new(
        orchestrator: Arc<RefinementOrchestrator>,
        source: Arc<dyn PositionSource>,
        settings: SchedulerSettings,
        logger: DynLogger,
    ) -> Self {
        Self {
            orchestrator,
            source,
            settings,
            logger,
        }
    }

    pub fn spawn(self) -> SchedulerControl {
        let (activity, activity_rx) = watch::channel(false);
        let nudge = Arc::new(Notify::new());
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(self.run(activity_rx, Arc::clone(&nudge), shutdown.clone()));
        SchedulerControl {
            activity,
            nudge,
            shutdown,
            task,
        }
    }

    async fn run(self, mut activity: watch::Receiver<bool>, nudge: Arc<Notify>, shutdown: CancellationToken) {
        let mut last_run: Option<Instant> = None;

        loop {
            // Inactive: wait for activation.
            loop {
                let active = *activity.borrow_and_update();
                if active {
                    break;
                }
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => return,
                    changed = activity.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
            }

            self.logger.info(&format!(
                "[{}] view active, scheduling every {:?}",
                self.orchestrator.id(),
                self.settings.period
            ));
            let mut ticker = tokio::time::interval(self.settings.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => {
                        self.orchestrator.teardown();
                        return;
                    }
                    changed = activity.changed() => {
                        if changed.is_err() {
                            self.orchestrator.teardown();
                            return;
                        }
                        let active = *activity.borrow_and_update();
                        if !active {
                            self.logger.info(&format!(
                                "[{}] view inactive, tearing down",
                                self.orchestrator.id()
                            ));
                            self.orchestrator.teardown();
                            break;
                        }
                    }
                    _ = ticker.tick() => self.try_run(&mut last_run),
                    _ = nudge.notified() => self.try_run(&mut last_run),
                }
            }
        }
    }

    fn try_run(&self, last_run: &mut Option<Instant>) {
        if !self.orchestrator.state().accepts_run() || self.orchestrator.has_active_round() {
            return;
        }
        let now = Instant::now();
        if let Some(prev) = *last_run {
            if now.duration_since(prev) < self.settings.min_interval {
                return;
            }
        }

        match self.orchestrator.begin(self.source.snapshot()) {
            Ok(Some(ticket)) => {
                *last_run = Some(now);
                let orchestrator = Arc::clone(&self.orchestrator);
                tokio::spawn(async move {
                    orchestrator.drive(ticket).await;
                });
            }
            Ok(None) => {}
            Err(e) => {
                *last_run = Some(now);
                self.logger
                    .warn(&format!("[{}] run rejected: {}", self.orchestrator.id(), e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_config() {
        let settings = SchedulerSettings::from_config(&SchedulerConfig {
            period_ms: 250,
            min_interval_ms: 100,
        });
        assert_eq!(settings.period, Duration::from_millis(250));
        assert_eq!(settings.min_interval, Duration::from_millis(100));
        assert_eq!(SchedulerSettings::default().period, Duration::from_secs(1));
    }
}
