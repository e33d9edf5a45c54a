//! Error types for the licensing module.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Blank license key; rejected before any I/O.
    #[error("license key is required")]
    EmptyKey,

    /// The license service answered with `success: false`.
    #[error("license rejected: {0}")]
    RemoteRejected(String),

    /// Service unreachable, timed out, or answered with something that is not JSON.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service reported success but the body is missing required fields.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Persisted license state could not be read back.
    #[error("stored license corrupted: {0}")]
    StorageCorrupted(String),

    /// Persisted license state could not be written.
    #[error("storage error: {0}")]
    Storage(String),

    /// Caller-supplied input failed local checks.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl LicenseError {
    /// Maps this error onto the failure tag carried by a `ValidationResult`.
    ///
    /// Storage and configuration errors never reach a validation result and
    /// map to `None`.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::EmptyKey => Some(FailureKind::EmptyKey),
            Self::RemoteRejected(_) => Some(FailureKind::RemoteRejected),
            Self::Transport(_) | Self::Http(_) => Some(FailureKind::TransportFailure),
            Self::MalformedResponse(_) | Self::Serialization(_) => {
                Some(FailureKind::MalformedResponse)
            }
            _ => None,
        }
    }

    /// Returns true if a retry may succeed without the caller changing anything.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Http(_) | Self::MalformedResponse(_)
        )
    }
}

/// Why a validation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    EmptyKey,
    RemoteRejected,
    TransportFailure,
    MalformedResponse,
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
