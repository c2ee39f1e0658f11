// src/core/error.rs

use thiserror::Error;

/// Everything that can go wrong while producing a verdict.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// Bad or empty URL/handle. The caller should not retry as-is.
    #[error("{0}")]
    InvalidInput(String),

    /// The reputation service could not be reached, answered with an
    /// unexpected status, or sent a payload we could not read.
    #[error("Reputation service unavailable: {reason}")]
    UpstreamUnavailable { status: Option<u16>, reason: String },

    /// The process is missing required configuration (e.g. the API key).
    #[error("Service configuration error: {0}")]
    Configuration(String),
}

impl ScanError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        ScanError::InvalidInput(reason.into())
    }

    pub fn upstream(reason: impl Into<String>) -> Self {
        ScanError::UpstreamUnavailable { status: None, reason: reason.into() }
    }

    pub fn upstream_status(status: u16, reason: impl Into<String>) -> Self {
        ScanError::UpstreamUnavailable { status: Some(status), reason: reason.into() }
    }

    /// Upstream HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ScanError::UpstreamUnavailable { status, .. } => *status,
            _ => None,
        }
    }
}

pub type ScanResult<T> = Result<T, ScanError>;
