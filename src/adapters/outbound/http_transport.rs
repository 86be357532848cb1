//! `psi_server` over HTTP: one JSON POST per round.

use crate::common::{DomainError, DomainResult, RoundError};
use crate::config::EndpointConfig;
use crate::domains::intersection::{RoundRequest, RoundTransport, WireResponse};
use async_trait::async_trait;
use std::time::Duration;

pub struct HttpRoundTransport {
    http: reqwest::Client,
    endpoint: EndpointConfig,
}

impl HttpRoundTransport {
    pub fn new(endpoint: &EndpointConfig) -> DomainResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(endpoint.timeout_ms))
            .build()
            .map_err(|e| DomainError::InfrastructureError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.clone(),
        })
    }

    /// Endpoint for the next request. Resolved per call so an override
    /// installed after construction still applies.
    pub fn endpoint(&self) -> String {
        self.endpoint.resolve()
    }
}

#[async_trait]
impl RoundTransport for HttpRoundTransport {
    async fn exchange(&self, request: &RoundRequest) -> Result<WireResponse, RoundError> {
        let url = self.endpoint();
        tracing::debug!(
            url = %url,
            bob_units = request.prover_set.len(),
            alice_units = request.verifier_set.len(),
            "posting PSI round"
        );

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| RoundError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoundError::Transport(format!(
                "PSI server responded with status {}",
                status.as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RoundError::Transport(e.to_string()))?;

        let payload: WireResponse = serde_json::from_slice(&bytes)
            .map_err(|e| RoundError::Transport(format!("malformed PSI server reply: {e}")))?;

        tracing::debug!(
            url = %url,
            status = status.as_u16(),
            decrypted = payload.decrypted.as_ref().map_or(0, Vec::len),
            "PSI round reply received"
        );
        Ok(payload)
    }
}
