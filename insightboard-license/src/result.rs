//! Outcome types returned to the embedding application.

use crate::error::{FailureKind, LicenseError};
use insightboard_types::{FeatureEntitlement, LicenseRecord};
use serde::{Deserialize, Serialize};

/// Message returned when the license service cannot be reached.
pub const SERVICE_UNAVAILABLE_MESSAGE: &str = "License validation service unavailable";
/// Message returned for a blank key.
pub const EMPTY_KEY_MESSAGE: &str = "Please enter a license key";
/// Message returned when the service reply is unusable.
pub const MALFORMED_RESPONSE_MESSAGE: &str = "Invalid response from license service";

/// Outcome of a license validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub success: bool,
    /// Human-readable message, suitable for a notification.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<LicenseRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureEntitlement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_activations: Option<u32>,
    /// Set when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl ValidationResult {
    /// A successful validation.
    #[must_use]
    pub fn accepted(
        message: impl Into<String>,
        license: LicenseRecord,
        features: FeatureEntitlement,
        remaining_activations: Option<u32>,
    ) -> Self {
        Self {
            success: true,
            message: message.into(),
            license: Some(license),
            features: Some(features),
            remaining_activations,
            failure: None,
        }
    }

    /// A failed validation.
    #[must_use]
    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            license: None,
            features: None,
            remaining_activations: None,
            failure: Some(kind),
        }
    }

    /// Converts an error into a failed result with a user-facing message.
    ///
    /// Rejections keep the service's own wording.
    #[must_use]
    pub fn from_error(err: &LicenseError) -> Self {
        match err {
            LicenseError::EmptyKey => Self::failed(FailureKind::EmptyKey, EMPTY_KEY_MESSAGE),
            LicenseError::RemoteRejected(reason) => {
                Self::failed(FailureKind::RemoteRejected, reason.clone())
            }
            LicenseError::MalformedResponse(_) | LicenseError::Serialization(_) => {
                Self::failed(FailureKind::MalformedResponse, MALFORMED_RESPONSE_MESSAGE)
            }
            _ => Self::failed(FailureKind::TransportFailure, SERVICE_UNAVAILABLE_MESSAGE),
        }
    }

    /// Returns true if this result may be remembered in the validation cache.
    ///
    /// Only definitive answers from the service are cached.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.success || self.failure == Some(FailureKind::RemoteRejected)
    }
}

/// Licensing state of this installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseState {
    /// No license record is loaded.
    Unlicensed,
    /// A record is loaded, active, and valid on this domain.
    Active,
    /// A record is loaded but inactive or pinned to another domain.
    Inactive,
}

impl LicenseState {
    /// Returns true if the UI should unlock.
    #[must_use]
    pub fn is_licensed(&self) -> bool {
        matches!(self, Self::Active)
    }
}
