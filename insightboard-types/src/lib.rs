//! License and entitlement types for Insightboard.
//!
//! This crate defines the plain data model shared by the licensing layer
//! and by anything that gates on it:
//! - License records as returned by the license service
//! - Feature entitlements (flags and daily request limits)
//! - License key normalization
//!
//! Nothing here performs I/O. Validation, caching and persistence live in
//! `insightboard-license`.

mod entitlement;
pub mod key;
mod record;

pub use entitlement::{AiFeatureLevel, DailyRequests, Feature, FeatureEntitlement};
pub use record::{LicenseRecord, LicenseType};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown feature: {0}")]
    UnknownFeature(String),

    #[error("unknown license type: {0}")]
    UnknownLicenseType(String),
}
