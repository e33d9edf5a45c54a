//! Persistent storage of the active license and its entitlement.
//!
//! The pair is stored as one JSON blob:
//! `{ "license": LicenseRecord | null, "features": FeatureEntitlement | null }`.
//! Persistence is best-effort: read and write failures are logged and
//! swallowed, and an unreadable blob is treated as "no license".

use crate::config::LicenseConfig;
use crate::error::{LicenseError, LicenseResult};
use insightboard_types::{FeatureEntitlement, LicenseRecord};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// A license record together with the entitlement the service granted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredLicense {
    pub license: LicenseRecord,
    pub features: FeatureEntitlement,
}

#[derive(Serialize, Deserialize)]
struct StoredBlob {
    license: Option<LicenseRecord>,
    features: Option<FeatureEntitlement>,
}

/// Encodes a stored pair into the persisted blob format.
pub fn encode_blob(stored: &StoredLicense) -> LicenseResult<String> {
    let blob = StoredBlob {
        license: Some(stored.license.clone()),
        features: Some(stored.features.clone()),
    };
    Ok(serde_json::to_string(&blob)?)
}

/// Decodes a persisted blob.
///
/// An empty pair (`null`/`null`) decodes to `None`. A blob holding only one
/// half of the pair is corrupted.
pub fn decode_blob(raw: &str) -> LicenseResult<Option<StoredLicense>> {
    let blob: StoredBlob = serde_json::from_str(raw)
        .map_err(|e| LicenseError::StorageCorrupted(e.to_string()))?;
    match (blob.license, blob.features) {
        (Some(license), Some(features)) => Ok(Some(StoredLicense { license, features })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(LicenseError::StorageCorrupted(
            "license stored without features".to_string(),
        )),
        (None, Some(_)) => Err(LicenseError::StorageCorrupted(
            "features stored without license".to_string(),
        )),
    }
}

/// Durable storage for the current license.
pub trait LicenseStore: Send + Sync {
    /// Returns the stored pair, or `None` if absent or unreadable.
    fn load(&self) -> Option<StoredLicense>;

    /// Replaces the stored pair. Failures are logged, not returned.
    fn save(&self, stored: &StoredLicense);

    /// Removes all stored state.
    fn clear(&self);
}

/// Stores the license as a JSON file, one file per domain.
#[derive(Debug, Clone)]
pub struct FileLicenseStore {
    path: PathBuf,
}

impl FileLicenseStore {
    /// Creates a store for `domain` under `dir`.
    ///
    /// The file is named `<namespace>-<scope>.json`, where `scope` is derived
    /// from the domain so installs on different hosts never share state.
    pub fn new(dir: impl Into<PathBuf>, namespace: &str, domain: &str) -> Self {
        let file_name = format!("{namespace}-{}.json", origin_scope(domain));
        Self {
            path: dir.into().join(file_name),
        }
    }

    /// Creates a store from the validator configuration.
    pub fn from_config(config: &LicenseConfig) -> LicenseResult<Self> {
        let dir = config.resolved_storage_dir().ok_or_else(|| {
            LicenseError::Storage("could not determine config directory".to_string())
        })?;
        Ok(Self::new(dir, &config.storage_namespace, &config.domain))
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    fn write_atomic(&self, content: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.tmp_path();
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)
    }

    fn remove(&self) {
        for path in [self.path.clone(), self.tmp_path()] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
    }
}

impl LicenseStore for FileLicenseStore {
    fn load(&self) -> Option<StoredLicense> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read stored license {}: {}", self.path.display(), e);
                return None;
            }
        };

        match decode_blob(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Discarding stored license {}: {}", self.path.display(), e);
                self.remove();
                None
            }
        }
    }

    fn save(&self, stored: &StoredLicense) {
        let content = match encode_blob(stored) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to encode license for storage: {}", e);
                return;
            }
        };
        match self.write_atomic(&content) {
            Ok(()) => debug!("Stored license at {}", self.path.display()),
            Err(e) => warn!("Failed to store license at {}: {}", self.path.display(), e),
        }
    }

    fn clear(&self) {
        self.remove();
    }
}

/// Keeps the serialized blob in memory.
///
/// Goes through the same encode/decode path as the file store, so it also
/// serves as a test double that can be seeded with arbitrary text.
#[derive(Debug, Default)]
pub struct MemoryLicenseStore {
    blob: Mutex<Option<String>>,
}

impl MemoryLicenseStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `raw` as its persisted blob.
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(raw.into())),
        }
    }

    /// Returns the persisted blob as written.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.blob.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl LicenseStore for MemoryLicenseStore {
    fn load(&self) -> Option<StoredLicense> {
        let mut blob = self.blob.lock().unwrap_or_else(PoisonError::into_inner);
        let raw = blob.as_deref()?;
        match decode_blob(raw) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Discarding stored license: {}", e);
                *blob = None;
                None
            }
        }
    }

    fn save(&self, stored: &StoredLicense) {
        match encode_blob(stored) {
            Ok(content) => {
                *self.blob.lock().unwrap_or_else(PoisonError::into_inner) = Some(content);
            }
            Err(e) => warn!("Failed to encode license for storage: {}", e),
        }
    }

    fn clear(&self) {
        *self.blob.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Short, filesystem-safe scope derived from a domain (first 8 bytes of SHA-256, hex).
#[must_use]
pub fn origin_scope(domain: &str) -> String {
    let normalized = domain.trim().to_ascii_lowercase();
    let hash = Sha256::digest(normalized.as_bytes());
    hex::encode(&hash[..8])
}
