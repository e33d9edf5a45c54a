//! Licensing and entitlement gating for Insightboard.
//!
//! This module handles:
//! - Remote license validation, deactivation and key generation
//! - A short-lived validation cache keyed by (license key, domain)
//! - Persistence of the active license and its entitlement per domain
//! - Entitlement queries used to gate the dashboard
//!
//! # Design Principles
//!
//! - **Server-decided entitlements**: the client stores exactly the feature
//!   set the service returned and never derives one locally
//! - **Never throw into the UI**: validation failures become a
//!   [`ValidationResult`] with `success: false`
//! - **Best-effort persistence**: storage problems are logged, never fatal
//! - **Record and entitlement move together**: they are written and cleared
//!   as one unit
//!
//! # Usage
//!
//! ```no_run
//! use insightboard_license::{LicenseConfig, LicenseValidator};
//!
//! # async fn run() -> insightboard_license::LicenseResult<()> {
//! let validator = LicenseValidator::from_config(LicenseConfig::default().apply_env())?;
//! validator.bootstrap().await;
//! if !validator.has_valid_license() {
//!     let result = validator.validate_license("AI-DASH-REG-DEMO-2024", false).await;
//!     println!("{}", result.message);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
mod cache;
mod config;
mod error;
mod result;
pub mod store;
mod validator;

pub use api::{GenerateRequest, GeneratedLicense, HttpLicenseApi, LicenseApi, ValidateOutcome};
pub use cache::{CacheKey, ValidationCache};
pub use config::{
    AutoActivation, LicenseConfig, DEFAULT_CACHE_TTL_SECS, DEFAULT_DEMO_REQUEST_LIMIT,
    ENV_API_BASE_URL, ENV_DOMAIN, ENV_EMBEDDED_KEY, UNLIMITED_REQUESTS,
};
pub use error::{FailureKind, LicenseError, LicenseResult};
pub use result::{
    LicenseState, ValidationResult, EMPTY_KEY_MESSAGE, MALFORMED_RESPONSE_MESSAGE,
    SERVICE_UNAVAILABLE_MESSAGE,
};
pub use store::{FileLicenseStore, LicenseStore, MemoryLicenseStore, StoredLicense};
pub use validator::LicenseValidator;

pub use insightboard_types::{
    AiFeatureLevel, DailyRequests, Feature, FeatureEntitlement, LicenseRecord, LicenseType,
};
