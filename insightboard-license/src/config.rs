//! Configuration for the license validator.

use crate::error::{LicenseError, LicenseResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long a validation outcome may be served from cache (5 minutes).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;

/// Daily AI request allowance when no license is loaded.
pub const DEFAULT_DEMO_REQUEST_LIMIT: u64 = 5;

/// Returned by `ai_request_limit` when the entitlement is unlimited.
pub const UNLIMITED_REQUESTS: u64 = u64::MAX;

/// Environment variable overriding `api_base_url`.
pub const ENV_API_BASE_URL: &str = "INSIGHTBOARD_LICENSE_API";
/// Environment variable overriding `domain`.
pub const ENV_DOMAIN: &str = "INSIGHTBOARD_DOMAIN";
/// Environment variable providing an embedded key for auto-activation.
pub const ENV_EMBEDDED_KEY: &str = "INSIGHTBOARD_LICENSE_KEY";

/// Distributor pre-activation: validate an embedded key at boot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoActivation {
    /// Whether `bootstrap` should try the embedded key.
    pub enabled: bool,
    /// The key shipped with the build.
    pub embedded_key: Option<String>,
}

impl AutoActivation {
    /// Returns the embedded key if auto-activation is enabled and a key is set.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.embedded_key
            .as_deref()
            .and_then(insightboard_types::key::normalize_key)
    }
}

/// License validator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    /// Base URL of the license service (e.g. `https://api.insightboard.app`).
    pub api_base_url: String,
    /// Hostname this installation runs on.
    pub domain: String,
    /// Validation cache TTL in seconds.
    pub cache_ttl_secs: u64,
    /// Daily AI requests allowed without a license.
    pub demo_request_limit: u64,
    /// HTTP timeout for license service calls.
    pub request_timeout_secs: u64,
    /// Directory for the persisted license. Defaults to the user config dir.
    pub storage_dir: Option<PathBuf>,
    /// Namespace used to name the persisted license file.
    pub storage_namespace: String,
    /// Optional pre-activation with an embedded key.
    pub auto_activation: Option<AutoActivation>,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.insightboard.app".to_string(),
            domain: "localhost".to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            demo_request_limit: DEFAULT_DEMO_REQUEST_LIMIT,
            request_timeout_secs: 10,
            storage_dir: None,
            storage_namespace: "insightboard-license".to_string(),
            auto_activation: None,
        }
    }
}

impl LicenseConfig {
    /// Loads configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: &Path) -> LicenseResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LicenseError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| LicenseError::Config(format!("failed to parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Overrides fields from `INSIGHTBOARD_*` environment variables.
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Overrides fields from a variable lookup. Blank values are ignored.
    #[must_use]
    pub fn apply_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_BASE_URL) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(domain) = get(ENV_DOMAIN) {
            self.domain = domain.trim().to_string();
        }
        if let Some(key) = get(ENV_EMBEDDED_KEY) {
            self.auto_activation = Some(AutoActivation {
                enabled: true,
                embedded_key: Some(key.trim().to_string()),
            });
        }
        self
    }

    /// Checks values that would make the validator unusable.
    pub fn validate(&self) -> LicenseResult<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(LicenseError::Config("api_base_url is empty".to_string()));
        }
        if self.domain.trim().is_empty() {
            return Err(LicenseError::Config("domain is empty".to_string()));
        }
        if self.storage_namespace.trim().is_empty() {
            return Err(LicenseError::Config("storage_namespace is empty".to_string()));
        }
        Ok(())
    }

    /// Validation cache TTL.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// HTTP request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Directory for the persisted license, if one can be determined.
    #[must_use]
    pub fn resolved_storage_dir(&self) -> Option<PathBuf> {
        self.storage_dir
            .clone()
            .or_else(|| dirs::config_dir().map(|d| d.join("insightboard")))
    }
}
