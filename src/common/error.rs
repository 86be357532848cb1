use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid coordinate value: {value}")]
    InvalidCoordinate { value: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("Unrecognised cell identifier: {value}")]
    UnrecognisedCell { value: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Infrastructure error: {0}")]
    InfrastructureError(String),
}

impl DomainError {
    pub fn invalid_coordinate(value: impl ToString) -> Self {
        DomainError::InvalidCoordinate {
            value: value.to_string(),
        }
    }

    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        DomainError::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

/// Failures of a single round against the PSI server.
///
/// Cancellation is not represented here: an aborted round settles as
/// `RoundOutcome::Aborted` and never surfaces as an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoundError {
    /// The server answered with an explicit `error` payload.
    #[error("PSI backend error: {0}")]
    Backend(String),

    /// Non-2xx status, malformed JSON, network failure or timeout.
    #[error("PSI server request failed: {0}")]
    Transport(String),
}

/// A reply that parsed but could not be interpreted is the backend's fault.
impl From<DomainError> for RoundError {
    fn from(err: DomainError) -> Self {
        RoundError::Backend(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Round error: {0}")]
    Round(#[from] RoundError),

    #[error("Round was aborted")]
    Aborted,

    #[error("Configuration error: {0}")]
    Configuration(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
pub type ApplicationResult<T> = Result<T, ApplicationError>;
