//! Short-lived memoization of validation outcomes.
//!
//! Entries are keyed by (license key, domain) and expire lazily on read.
//! There is no background sweep: an install only ever tries a handful of keys.

use crate::result::ValidationResult;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Composite cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub license_key: String,
    pub domain: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(license_key: &str, domain: &str) -> Self {
        Self {
            license_key: license_key.to_string(),
            domain: domain.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    result: ValidationResult,
    stored_at: Instant,
}

/// In-memory validation cache with a fixed TTL.
#[derive(Debug)]
pub struct ValidationCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl ValidationCache {
    /// Creates an empty cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the configured TTL.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached result if present and younger than the TTL.
    pub fn get(&self, license_key: &str, domain: &str) -> Option<ValidationResult> {
        let key = CacheKey::new(license_key, domain);
        let mut entries = self.lock();
        let entry = entries.get(&key)?;
        if entry.stored_at.elapsed() < self.ttl {
            return Some(entry.result.clone());
        }
        debug!("Validation cache entry expired for domain {}", domain);
        entries.remove(&key);
        None
    }

    /// Stores `result`, replacing any previous entry for the same key.
    pub fn put(&self, license_key: &str, domain: &str, result: ValidationResult) {
        let entry = CacheEntry {
            result,
            stored_at: Instant::now(),
        };
        self.lock().insert(CacheKey::new(license_key, domain), entry);
    }

    /// Removes the entry for (key, domain).
    pub fn invalidate(&self, license_key: &str, domain: &str) {
        self.lock().remove(&CacheKey::new(license_key, domain));
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
