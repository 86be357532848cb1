//! One-shot rounds over caller-supplied units, outside any orchestrator.

use crate::common::{ApplicationError, ApplicationResult};
use crate::domains::intersection::{
    normalize_json_units, normalize_units, RoundHandle, RoundOutcome, RoundRequest, RoundResult,
    RoundTransport, UnitInput,
};
use crate::domains::logger::DynLogger;
use serde_json::Value;
use std::sync::Arc;

pub struct RoundClient {
    transport: Arc<dyn RoundTransport>,
    logger: DynLogger,
}

impl RoundClient {
    pub fn new(transport: Arc<dyn RoundTransport>, logger: DynLogger) -> Self {
        Self { transport, logger }
    }

    /// Normalize both unit lists and start the round. Coordinate errors are
    /// returned before anything is sent.
    pub fn start(&self, bob_units: &[UnitInput], alice_units: &[UnitInput]) -> ApplicationResult<RoundHandle> {
        let request = RoundRequest::new(
            normalize_units(bob_units, "bob")?,
            normalize_units(alice_units, "alice")?,
        );
        Ok(self.start_request(request))
    }

    pub async fn run_once(&self, bob_units: &[UnitInput], alice_units: &[UnitInput]) -> ApplicationResult<RoundResult> {
        let handle = self.start(bob_units, alice_units)?;
        self.finish(handle).await
    }

    /// [`run_once`](Self::run_once) over raw JSON units.
    pub async fn run_json(&self, bob_units: &[Value], alice_units: &[Value]) -> ApplicationResult<RoundResult> {
        let request = RoundRequest::new(
            normalize_json_units(bob_units, "bob")?,
            normalize_json_units(alice_units, "alice")?,
        );
        self.finish(self.start_request(request)).await
    }

    fn start_request(&self, request: RoundRequest) -> RoundHandle {
        self.logger.info(&format!(
            "starting round: {} bob units, {} alice units",
            request.prover_set.len(),
            request.verifier_set.len()
        ));
        RoundHandle::start(Arc::clone(&self.transport), request)
    }

    async fn finish(&self, handle: RoundHandle) -> ApplicationResult<RoundResult> {
        match handle.settle().await {
            RoundOutcome::Completed(result) => {
                self.logger.info(&format!(
                    "round completed: {} intersections in {:.1} ms",
                    result.intersected.len(),
                    result.performance.total_time
                ));
                Ok(result)
            }
            RoundOutcome::Failed(err) => {
                self.logger.error(&format!("round failed: {err}"));
                Err(ApplicationError::Round(err))
            }
            RoundOutcome::Aborted => Err(ApplicationError::Aborted),
        }
    }
}
