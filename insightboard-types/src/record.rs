//! License records as issued by the license service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The purchased license tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseType {
    /// Single end product, no resale.
    Regular,
    /// Extended usage rights (SaaS, resale).
    Extended,
}

impl LicenseType {
    /// Returns the wire name of this tier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Extended => "extended",
        }
    }
}

impl fmt::Display for LicenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LicenseType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regular" => Ok(Self::Regular),
            "extended" => Ok(Self::Extended),
            other => Err(crate::Error::UnknownLicenseType(other.to_string())),
        }
    }
}

/// A license record (matches the service JSON structure).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRecord {
    /// Opaque identifier assigned by the service.
    pub id: String,
    /// The license key, e.g. `AI-DASH-REG-DEMO-2024`.
    pub key: String,
    /// Purchaser email.
    pub email: String,
    /// License tier.
    #[serde(rename = "type")]
    pub license_type: LicenseType,
    /// Hostname the license is pinned to, once activated on a domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Whether this license currently grants access.
    pub is_active: bool,
    /// Number of activations consumed.
    pub activation_count: u32,
    /// Maximum number of activations allowed.
    pub max_activations: u32,
    /// When the license was created.
    pub created_at: DateTime<Utc>,
}

impl LicenseRecord {
    /// Returns how many activations are left.
    #[must_use]
    pub fn remaining_activations(&self) -> u32 {
        self.max_activations.saturating_sub(self.activation_count)
    }

    /// Returns true if another activation would be accepted.
    #[must_use]
    pub fn can_activate(&self) -> bool {
        self.activation_count < self.max_activations
    }

    /// Returns true if the license is pinned to `domain`, or not pinned at all.
    ///
    /// Hostnames compare case-insensitively.
    #[must_use]
    pub fn is_bound_to(&self, domain: &str) -> bool {
        match &self.domain {
            None => true,
            Some(bound) => bound.eq_ignore_ascii_case(domain.trim()),
        }
    }

    /// Returns true if this record grants access when running on `domain`.
    #[must_use]
    pub fn is_valid_for(&self, domain: &str) -> bool {
        self.is_active && self.activation_count <= self.max_activations && self.is_bound_to(domain)
    }
}
