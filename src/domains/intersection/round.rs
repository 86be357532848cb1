use super::adapter::adapt_response;
use super::ports::RoundTransport;
use super::types::RoundResult;
use super::wire::RoundRequest;
use crate::common::RoundError;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// How a round settled. Produced exactly once per started round.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundOutcome {
    Completed(RoundResult),
    Failed(RoundError),
    /// `abort()` was called before the outcome was observed.
    Aborted,
}

/// Cloneable abort switch for a running round. Idempotent.
#[derive(Debug, Clone)]
pub struct RoundAbort {
    token: CancellationToken,
}

impl RoundAbort {
    pub fn abort(&self) {
        self.token.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// A round in flight against a [`RoundTransport`].
///
/// The exchange runs on its own task. Aborting drops the in-flight request
/// future and forces the outcome to [`RoundOutcome::Aborted`], even if the
/// server's reply raced the abort.
pub struct RoundHandle {
    token: CancellationToken,
    outcome: oneshot::Receiver<RoundOutcome>,
}

impl RoundHandle {
    pub fn start(transport: Arc<dyn RoundTransport>, request: RoundRequest) -> Self {
        Self::start_with_token(transport, request, CancellationToken::new())
    }

    /// Start a round that is aborted when `token` is cancelled.
    pub fn start_with_token(
        transport: Arc<dyn RoundTransport>,
        request: RoundRequest,
        token: CancellationToken,
    ) -> Self {
        let (tx, rx) = oneshot::channel();
        let task_token = token.clone();

        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = task_token.cancelled() => RoundOutcome::Aborted,
                reply = transport.exchange(&request) => match reply.and_then(adapt_response) {
                    Ok(result) => RoundOutcome::Completed(result),
                    Err(err) => RoundOutcome::Failed(err),
                },
            };
            // Receiver may already be gone after an abort.
            let _ = tx.send(outcome);
        });

        Self { token, outcome: rx }
    }

    pub fn abort(&self) {
        self.token.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn abort_handle(&self) -> RoundAbort {
        RoundAbort {
            token: self.token.clone(),
        }
    }

    /// Wait for the round to settle.
    pub async fn settle(self) -> RoundOutcome {
        let outcome = self.outcome.await;
        if self.token.is_cancelled() {
            return RoundOutcome::Aborted;
        }
        match outcome {
            Ok(outcome) => outcome,
            Err(_) => RoundOutcome::Failed(RoundError::Transport(
                "round task ended without settling".to_string(),
            )),
        }
    }
}
