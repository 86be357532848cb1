use super::types::{PositionSnapshot, RoundPublication};
use super::wire::{RoundRequest, WireResponse};
use crate::common::RoundError;
use async_trait::async_trait;

/// Port to the remote intersection computation. One call is one round.
///
/// Implementations must map non-2xx replies, malformed JSON, network
/// failures and timeouts to [`RoundError::Transport`]. Cancellation is the
/// caller's concern: the returned future may be dropped at any await point.
#[async_trait]
pub trait RoundTransport: Send + Sync {
    async fn exchange(&self, request: &RoundRequest) -> Result<WireResponse, RoundError>;
}

/// Pull-based source of live positions for both parties.
pub trait PositionSource: Send + Sync {
    fn snapshot(&self) -> PositionSnapshot;
}

/// Receives every status change and settled round. Implementations must
/// not call back into the orchestrator.
pub trait StatusSink: Send + Sync {
    fn publish(&self, publication: &RoundPublication);
}
