use std::time::Duration;

use thiserror::Error;

/// Failures on the live routing path. None of these escape the oracle; they
/// decide whether to retry and are logged before falling back.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("routing service returned http {0}")]
    Upstream(u16),

    #[error("routing service status {status}: {message}")]
    ServiceStatus { status: String, message: String },

    #[error("route element status {0}")]
    ElementStatus(String),

    #[error("malformed routing response: {0}")]
    MalformedResponse(String),
}

impl OracleError {
    pub fn is_retryable(&self) -> bool {
        match self {
            OracleError::Http(err) => !err.is_decode() && !err.is_builder(),
            OracleError::Timeout(_) => true,
            OracleError::Upstream(status) => *status >= 500 || *status == 429,
            OracleError::ServiceStatus { .. }
            | OracleError::ElementStatus(_)
            | OracleError::MalformedResponse(_) => false,
        }
    }
}
