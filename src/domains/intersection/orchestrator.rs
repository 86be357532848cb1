//! Two-level refinement of the mover/watcher intersection.
//!
//! A coarse round intersects mover cells with watcher visibility at the
//! coarse grid size. Only when it finds something does a fine round run, and
//! the fine round is restricted to movers and visibility cells whose coarse
//! ancestor was intersected. The fine round's cost is therefore bounded by
//! the geometry that already matched.
//!
//! State lives behind a short-lived mutex that is never held across an
//! await. The handle slot holds at most one in-flight round; a run request
//! while a round is in flight is dropped, not queued.

use super::ports::{RoundTransport, StatusSink};
use super::round::{RoundHandle, RoundOutcome};
use super::types::{
    intersected_cells, IntersectedUnit, LevelTiming, PositionSnapshot, RoundPublication,
    RoundResult, RoundState,
};
use super::wire::RoundRequest;
use crate::common::{DomainError, DomainResult, RoundError};
use crate::config::GridConfig;
use crate::domains::grid::{
    cell_to_coarse, quantize_all, quantize_position, visible_cells_for_all, CellSet, GridSize,
    ResolutionLevel, MAX_RADIUS_CELLS,
};
use crate::domains::logger::DynLogger;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Grid sizes and watcher radius for one orchestrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinementSettings {
    pub coarse: GridSize,
    pub fine: GridSize,
    pub visibility_radius: f64,
}

impl RefinementSettings {
    pub fn new(coarse_size: f64, fine_size: f64, visibility_radius: f64) -> DomainResult<Self> {
        let coarse = GridSize::new(coarse_size)?;
        let fine = GridSize::new(fine_size)?;
        if fine.get() >= coarse.get() {
            return Err(DomainError::invalid_configuration(format!(
                "fine grid size ({fine}) must be smaller than coarse grid size ({coarse})"
            )));
        }
        let ratio = coarse.get() / fine.get();
        if (ratio - ratio.round()).abs() > 1e-9 {
            return Err(DomainError::invalid_configuration(format!(
                "coarse grid size must be an integer multiple of the fine grid size (ratio {ratio})"
            )));
        }
        if !visibility_radius.is_finite() || visibility_radius < 0.0 {
            return Err(DomainError::invalid_configuration(format!(
                "visibility radius must be non-negative, got {visibility_radius}"
            )));
        }
        if visibility_radius / fine.get() > MAX_RADIUS_CELLS {
            return Err(DomainError::invalid_configuration(format!(
                "visibility radius {visibility_radius} spans more than {MAX_RADIUS_CELLS} fine cells"
            )));
        }
        Ok(Self {
            coarse,
            fine,
            visibility_radius,
        })
    }

    pub fn from_config(grid: &GridConfig) -> DomainResult<Self> {
        Self::new(grid.coarse_size, grid.fine_size, grid.visibility_radius)
    }

    pub fn grid(&self, level: ResolutionLevel) -> GridSize {
        match level {
            ResolutionLevel::Coarse => self.coarse,
            ResolutionLevel::Fine => self.fine,
        }
    }
}

/// Result of one [`RefinementOrchestrator::run`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// A round was already in flight; nothing happened.
    Skipped,
    /// The run finished in this state (`idle` or `error`).
    Settled(RoundState),
    /// Torn down while in flight; nothing was published for this run.
    Aborted,
}

/// Permission to drive one run, issued by [`RefinementOrchestrator::begin`].
#[derive(Debug)]
pub struct RoundTicket {
    generation: u64,
    snapshot: PositionSnapshot,
    request: RoundRequest,
    token: CancellationToken,
}

impl RoundTicket {
    pub fn request(&self) -> &RoundRequest {
        &self.request
    }
}

#[derive(Debug)]
struct ActiveRound {
    generation: u64,
    level: ResolutionLevel,
    abort: CancellationToken,
}

#[derive(Debug, Default)]
struct Inner {
    state: RoundState,
    active: Option<ActiveRound>,
    generation: u64,
    results: Vec<IntersectedUnit>,
    performance: Option<LevelTiming>,
}

impl Inner {
    fn owns(&self, generation: u64) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| a.generation == generation)
    }
}

pub struct RefinementOrchestrator {
    id: Uuid,
    settings: RefinementSettings,
    transport: Arc<dyn RoundTransport>,
    sink: Arc<dyn StatusSink>,
    logger: DynLogger,
    inner: Mutex<Inner>,
}

impl RefinementOrchestrator {
    pub fn new(
        settings: RefinementSettings,
        transport: Arc<dyn RoundTransport>,
        sink: Arc<dyn StatusSink>,
        logger: DynLogger,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            settings,
            transport,
            sink,
            logger,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &RefinementSettings {
        &self.settings
    }

    pub fn state(&self) -> RoundState {
        self.lock().state
    }

    /// Last successful result set. Kept while in `error`.
    pub fn results(&self) -> Vec<IntersectedUnit> {
        self.lock().results.clone()
    }

    pub fn performance(&self) -> Option<LevelTiming> {
        self.lock().performance.clone()
    }

    pub fn has_active_round(&self) -> bool {
        self.lock().active.is_some()
    }

    /// Level of the round currently in flight, if any.
    pub fn active_level(&self) -> Option<ResolutionLevel> {
        self.lock().active.as_ref().map(|a| a.level)
    }

    pub fn publication(&self) -> RoundPublication {
        self.publication_of(&self.lock())
    }

    /// Run a full coarse→fine cycle on `snapshot`.
    ///
    /// Invalid coordinates are returned as an error before any round starts.
    /// Backend and transport failures are not errors here: they move the
    /// orchestrator to `error` and are published.
    pub async fn run(&self, snapshot: PositionSnapshot) -> DomainResult<RunOutcome> {
        match self.begin(snapshot)? {
            Some(ticket) => Ok(self.drive(ticket).await),
            None => Ok(RunOutcome::Skipped),
        }
    }

    /// Synchronously claim the round slot and enter `processing-coarse`.
    ///
    /// Returns `Ok(None)` when a round is already in flight. The returned
    /// ticket must be passed to [`drive`](Self::drive).
    pub fn begin(&self, snapshot: PositionSnapshot) -> DomainResult<Option<RoundTicket>> {
        let publication = {
            let mut inner = self.lock();
            if inner.state.is_processing() || inner.active.is_some() {
                return Ok(None);
            }

            snapshot.ensure_finite()?;
            let movers = quantize_all(&snapshot.movers, self.settings.coarse);
            let watchers = visible_cells_for_all(
                &snapshot.watchers,
                self.settings.visibility_radius,
                self.settings.coarse,
            );
            let request = RoundRequest::from_cells(&movers, &watchers);

            inner.generation += 1;
            let token = CancellationToken::new();
            inner.active = Some(ActiveRound {
                generation: inner.generation,
                level: ResolutionLevel::Coarse,
                abort: token.clone(),
            });
            inner.state = RoundState::ProcessingCoarse;

            self.logger.info(&format!(
                "[{}] coarse round: {} mover cells, {} watcher cells at grid {}",
                self.id,
                movers.len(),
                watchers.len(),
                self.settings.coarse
            ));

            let ticket = RoundTicket {
                generation: inner.generation,
                snapshot,
                request,
                token,
            };
            (self.publication_of(&inner), ticket)
        };

        let (publication, ticket) = publication;
        self.sink.publish(&publication);
        Ok(Some(ticket))
    }

    /// Drive a claimed run to completion.
    pub async fn drive(&self, ticket: RoundTicket) -> RunOutcome {
        let RoundTicket {
            generation,
            snapshot,
            request,
            token,
        } = ticket;

        let coarse = match self.round(request, token).await {
            RoundOutcome::Completed(result) => result,
            RoundOutcome::Failed(err) => return self.fail(generation, ResolutionLevel::Coarse, err),
            RoundOutcome::Aborted => return RunOutcome::Aborted,
        };

        let fine = {
            let mut inner = self.lock();
            if !inner.owns(generation) {
                return RunOutcome::Aborted;
            }
            inner.performance = Some(self.level_timing(ResolutionLevel::Coarse, &coarse));

            if coarse.intersected.is_empty() {
                self.logger
                    .info(&format!("[{}] no coarse intersections, skipping fine round", self.id));
                drop(inner);
                return self.settle_idle(generation, Vec::new());
            }

            let intersected = match intersected_cells(&coarse.intersected) {
                Ok(cells) => cells,
                Err(err) => {
                    drop(inner);
                    return self.fail(generation, ResolutionLevel::Coarse, RoundError::from(err));
                }
            };

            match self.fine_request(&snapshot, &intersected) {
                None => {
                    self.logger.info(&format!(
                        "[{}] {} coarse intersections but nothing to refine",
                        self.id,
                        intersected.len()
                    ));
                    drop(inner);
                    return self.settle_idle(generation, Vec::new());
                }
                Some(request) => {
                    let token = CancellationToken::new();
                    inner.active = Some(ActiveRound {
                        generation,
                        level: ResolutionLevel::Fine,
                        abort: token.clone(),
                    });
                    inner.state = RoundState::ProcessingFine;
                    self.logger.info(&format!(
                        "[{}] fine round: {} mover cells, {} watcher cells at grid {}",
                        self.id,
                        request.prover_set.len(),
                        request.verifier_set.len(),
                        self.settings.fine
                    ));
                    let publication = self.publication_of(&inner);
                    drop(inner);
                    self.sink.publish(&publication);
                    (request, token)
                }
            }
        };

        let (request, token) = fine;
        let result = match self.round(request, token).await {
            RoundOutcome::Completed(result) => result,
            RoundOutcome::Failed(err) => return self.fail(generation, ResolutionLevel::Fine, err),
            RoundOutcome::Aborted => return RunOutcome::Aborted,
        };

        let publication = {
            let mut inner = self.lock();
            if !inner.owns(generation) {
                return RunOutcome::Aborted;
            }
            inner.performance = Some(self.level_timing(ResolutionLevel::Fine, &result));
            inner.results = result.intersected;
            inner.active = None;
            inner.state = RoundState::Idle;
            self.logger.info(&format!(
                "[{}] fine round found {} intersections",
                self.id,
                inner.results.len()
            ));
            self.publication_of(&inner)
        };
        self.sink.publish(&publication);
        RunOutcome::Settled(RoundState::Idle)
    }

    /// Leave `error` without running, dropping the stale results. No-op in
    /// any other state.
    pub fn reset(&self) {
        let publication = {
            let mut inner = self.lock();
            if inner.state != RoundState::Error {
                return;
            }
            inner.state = RoundState::Idle;
            inner.results.clear();
            inner.performance = None;
            self.publication_of(&inner)
        };
        self.sink.publish(&publication);
    }

    /// Abort the in-flight round, drop the handle slot and force `idle`.
    /// Does not wait for the aborted round to settle.
    pub fn teardown(&self) {
        let publication = {
            let mut inner = self.lock();
            if let Some(active) = inner.active.take() {
                active.abort.cancel();
                self.logger.info(&format!(
                    "[{}] teardown aborted {} round",
                    self.id, active.level
                ));
            }
            inner.state = RoundState::Idle;
            self.publication_of(&inner)
        };
        self.sink.publish(&publication);
    }

    async fn round(&self, request: RoundRequest, token: CancellationToken) -> RoundOutcome {
        RoundHandle::start_with_token(self.transport.clone(), request, token)
            .settle()
            .await
    }

    /// Restrict the snapshot to cells under `intersected` and build the fine
    /// request, or `None` when either side ends up empty.
    fn fine_request(
        &self,
        snapshot: &PositionSnapshot,
        intersected: &CellSet,
    ) -> Option<RoundRequest> {
        let RefinementSettings {
            coarse,
            fine,
            visibility_radius,
        } = self.settings;

        let movers = quantize_all(
            snapshot
                .movers
                .iter()
                .filter(|m| intersected.contains(&quantize_position(m, coarse))),
            fine,
        );
        let watchers: CellSet = visible_cells_for_all(&snapshot.watchers, visibility_radius, fine)
            .into_iter()
            .filter(|cell| intersected.contains(&cell_to_coarse(*cell, fine, coarse)))
            .collect();

        if movers.is_empty() || watchers.is_empty() {
            return None;
        }
        Some(RoundRequest::from_cells(&movers, &watchers))
    }

    fn settle_idle(&self, generation: u64, results: Vec<IntersectedUnit>) -> RunOutcome {
        let publication = {
            let mut inner = self.lock();
            if !inner.owns(generation) {
                return RunOutcome::Aborted;
            }
            inner.results = results;
            inner.active = None;
            inner.state = RoundState::Idle;
            self.publication_of(&inner)
        };
        self.sink.publish(&publication);
        RunOutcome::Settled(RoundState::Idle)
    }

    fn fail(&self, generation: u64, level: ResolutionLevel, err: RoundError) -> RunOutcome {
        let publication = {
            let mut inner = self.lock();
            if !inner.owns(generation) {
                return RunOutcome::Aborted;
            }
            inner.active = None;
            inner.state = RoundState::Error;
            inner.performance = None;
            self.publication_of(&inner)
        };
        self.logger
            .error(&format!("[{}] {} round failed: {}", self.id, level, err));
        self.sink.publish(&publication);
        RunOutcome::Settled(RoundState::Error)
    }

    fn level_timing(&self, level: ResolutionLevel, result: &RoundResult) -> LevelTiming {
        LevelTiming {
            level,
            grid_size: self.settings.grid(level).get(),
            timing: result.performance,
            backend_label: result.backend_label.clone(),
        }
    }

    fn publication_of(&self, inner: &Inner) -> RoundPublication {
        RoundPublication {
            orchestrator_id: self.id,
            status: inner.state,
            results: inner.results.clone(),
            performance: inner.performance.clone(),
            published_at: Utc::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
