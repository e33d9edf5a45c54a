//! The license validator service.
//!
//! Single source of truth for "is this installation licensed, and for what".
//! Construct one per process and share it behind an `Arc`; the store and the
//! service client are injected so either can be replaced in tests.
//!
//! Overlapping validations of the same key are not de-duplicated. Each one
//! calls the service and the last reply to arrive wins the store and cache
//! writes.

use crate::api::{GenerateRequest, GeneratedLicense, HttpLicenseApi, LicenseApi, ValidateOutcome};
use crate::cache::ValidationCache;
use crate::config::{LicenseConfig, UNLIMITED_REQUESTS};
use crate::error::{LicenseError, LicenseResult};
use crate::result::{LicenseState, ValidationResult};
use crate::store::{FileLicenseStore, LicenseStore, StoredLicense};
use insightboard_types::key::{is_well_formed, mask_key, normalize_key};
use insightboard_types::{Feature, FeatureEntitlement, LicenseRecord, LicenseType};
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};

/// Validates license keys and answers entitlement queries.
pub struct LicenseValidator {
    config: LicenseConfig,
    api: Arc<dyn LicenseApi>,
    store: Arc<dyn LicenseStore>,
    cache: ValidationCache,
    /// In-process copy of the stored pair. Always written together with the store.
    current: RwLock<Option<StoredLicense>>,
}

impl LicenseValidator {
    /// Creates a validator with explicit collaborators.
    ///
    /// Loads whatever the store holds; a corrupted store yields an unlicensed
    /// validator.
    pub fn new(
        config: LicenseConfig,
        api: Arc<dyn LicenseApi>,
        store: Arc<dyn LicenseStore>,
    ) -> Self {
        let current = store.load();
        if let Some(stored) = &current {
            debug!(
                "Loaded stored license {} for domain {}",
                mask_key(&stored.license.key),
                config.domain
            );
        }
        Self {
            cache: ValidationCache::new(config.cache_ttl()),
            config,
            api,
            store,
            current: RwLock::new(current),
        }
    }

    /// Creates a validator talking HTTP to the configured service and
    /// persisting to the configured directory.
    pub fn from_config(config: LicenseConfig) -> LicenseResult<Self> {
        config.validate()?;
        let api = Arc::new(HttpLicenseApi::from_config(&config)?);
        let store = Arc::new(FileLicenseStore::from_config(&config)?);
        Ok(Self::new(config, api, store))
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &LicenseConfig {
        &self.config
    }

    /// Returns the domain this validator checks licenses against.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.config.domain
    }

    /// Returns the validation cache.
    #[must_use]
    pub fn cache(&self) -> &ValidationCache {
        &self.cache
    }

    /// Validates `key` for this domain.
    ///
    /// Serves a cached outcome when one is fresh, unless `force_fresh` is set.
    /// Never returns an error: every failure is folded into a result with
    /// `success: false`. Transport failures and malformed replies are not
    /// cached so they are retried on the next call.
    pub async fn validate_license(&self, key: &str, force_fresh: bool) -> ValidationResult {
        let Some(key) = normalize_key(key) else {
            debug!("Rejecting blank license key");
            return ValidationResult::from_error(&LicenseError::EmptyKey);
        };
        let domain = self.config.domain.as_str();

        if !is_well_formed(key) {
            debug!("License key {} has an unusual shape", mask_key(key));
        }

        if !force_fresh {
            if let Some(cached) = self.cache.get(key, domain) {
                debug!("Serving cached validation for {}", mask_key(key));
                self.restore_cached(&cached);
                return cached;
            }
        }

        let result = match self.api.validate(key, domain).await {
            Ok(ValidateOutcome::Accepted {
                message,
                license,
                features,
                remaining_activations,
            }) => {
                info!(
                    "License {} validated for {} ({} tier)",
                    mask_key(key),
                    domain,
                    license.license_type
                );
                self.replace_current(Some(StoredLicense {
                    license: license.clone(),
                    features: features.clone(),
                }));
                ValidationResult::accepted(message, license, features, remaining_activations)
            }
            Ok(ValidateOutcome::Rejected { message }) => {
                info!("License {} rejected: {}", mask_key(key), message);
                ValidationResult::from_error(&LicenseError::RemoteRejected(message))
            }
            Ok(ValidateOutcome::Malformed { reason }) => {
                warn!("Malformed validation reply for {}: {}", mask_key(key), reason);
                ValidationResult::from_error(&LicenseError::MalformedResponse(reason))
            }
            Err(e) => {
                warn!("License validation for {} failed: {}", mask_key(key), e);
                ValidationResult::from_error(&e)
            }
        };

        if result.is_cacheable() {
            self.cache.put(key, domain, result.clone());
        }
        result
    }

    /// Releases the activation of `key` on this domain.
    ///
    /// On success the stored license and the cache entry for `key` are
    /// removed. On any failure local state is left untouched.
    pub async fn deactivate_license(&self, key: &str) -> bool {
        let Some(key) = normalize_key(key) else {
            debug!("Ignoring deactivation of blank license key");
            return false;
        };
        let domain = self.config.domain.as_str();

        match self.api.deactivate(key, domain).await {
            Ok(()) => {
                self.replace_current(None);
                self.cache.invalidate(key, domain);
                info!("License {} deactivated on {}", mask_key(key), domain);
                true
            }
            Err(e) => {
                warn!("License deactivation for {} failed: {}", mask_key(key), e);
                false
            }
        }
    }

    /// Requests a new key for a purchase. The key is not activated.
    pub async fn generate_license(
        &self,
        email: &str,
        purchase_code: &str,
        license_type: LicenseType,
    ) -> LicenseResult<GeneratedLicense> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(LicenseError::InvalidInput(format!(
                "invalid email address: {email:?}"
            )));
        }
        let purchase_code = purchase_code.trim();
        if purchase_code.is_empty() {
            return Err(LicenseError::InvalidInput(
                "purchase code is required".to_string(),
            ));
        }

        let request = GenerateRequest {
            email: email.to_string(),
            purchase_code: purchase_code.to_string(),
            license_type,
        };
        let generated = self.api.generate(&request).await?;
        info!("Generated {} license {}", license_type, mask_key(&generated.key));
        Ok(generated)
    }

    /// Boot-time entry point.
    ///
    /// If no valid license is loaded and auto-activation is configured with an
    /// embedded key, validates that key. Returns the resulting state.
    pub async fn bootstrap(&self) -> LicenseState {
        let state = self.state();
        if state.is_licensed() {
            return state;
        }

        let embedded = self
            .config
            .auto_activation
            .as_ref()
            .and_then(|a| a.key())
            .map(str::to_string);

        if let Some(key) = embedded {
            info!("Auto-activating embedded license {}", mask_key(&key));
            let result = self.validate_license(&key, false).await;
            if !result.success {
                warn!("Auto-activation failed: {}", result.message);
            }
        }
        self.state()
    }

    /// Returns the current license record, if any.
    #[must_use]
    pub fn current_license(&self) -> Option<LicenseRecord> {
        self.read_current().as_ref().map(|s| s.license.clone())
    }

    /// Returns the current entitlement, if any.
    #[must_use]
    pub fn current_features(&self) -> Option<FeatureEntitlement> {
        self.read_current().as_ref().map(|s| s.features.clone())
    }

    /// Returns the licensing state of this installation.
    #[must_use]
    pub fn state(&self) -> LicenseState {
        match self.read_current().as_ref() {
            None => LicenseState::Unlicensed,
            Some(s) if s.license.is_valid_for(&self.config.domain) => LicenseState::Active,
            Some(_) => LicenseState::Inactive,
        }
    }

    /// The gating predicate: a license is loaded, active, and valid on this domain.
    #[must_use]
    pub fn has_valid_license(&self) -> bool {
        self.state() == LicenseState::Active
    }

    /// Returns true if the named entitlement flag is granted.
    ///
    /// Unknown names and an unlicensed install both answer `false`.
    #[must_use]
    pub fn can_use_feature(&self, name: &str) -> bool {
        match Feature::from_str(name) {
            Ok(feature) => self.can_use(feature),
            Err(e) => {
                debug!("{}", e);
                false
            }
        }
    }

    /// Typed form of [`can_use_feature`](Self::can_use_feature).
    #[must_use]
    pub fn can_use(&self, feature: Feature) -> bool {
        self.read_current()
            .as_ref()
            .is_some_and(|s| s.features.allows(feature))
    }

    /// Daily AI request allowance.
    ///
    /// The entitlement's number, [`UNLIMITED_REQUESTS`] when it says
    /// unlimited, or the configured demo limit when unlicensed.
    #[must_use]
    pub fn ai_request_limit(&self) -> u64 {
        match self.read_current().as_ref() {
            None => self.config.demo_request_limit,
            Some(s) => s.features.request_limit().unwrap_or(UNLIMITED_REQUESTS),
        }
    }

    /// Forgets the license: wipes the store and the whole validation cache.
    pub fn clear_license(&self) {
        self.replace_current(None);
        self.cache.clear();
        info!("License cleared on {}", self.config.domain);
    }

    fn read_current(&self) -> RwLockReadGuard<'_, Option<StoredLicense>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes a cached success the current license again.
    ///
    /// The cache holds one entry per key while the store holds a single
    /// license, so a later validation or deactivation of another key may have
    /// replaced what this entry granted.
    fn restore_cached(&self, cached: &ValidationResult) {
        if !cached.success {
            return;
        }
        let (Some(license), Some(features)) = (&cached.license, &cached.features) else {
            return;
        };
        let stored = StoredLicense {
            license: license.clone(),
            features: features.clone(),
        };
        if self.read_current().as_ref() == Some(&stored) {
            return;
        }
        debug!("Restoring license {} from cache", mask_key(&license.key));
        self.replace_current(Some(stored));
    }

    /// Writes the store and the in-process copy together.
    fn replace_current(&self, next: Option<StoredLicense>) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        match &next {
            Some(stored) => self.store.save(stored),
            None => self.store.clear(),
        }
        *current = next;
    }
}
