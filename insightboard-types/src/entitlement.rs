//! Feature entitlements unlocked by a license.
//!
//! The entitlement is decided by the license service and stored verbatim.
//! Nothing in this module derives one from a license tier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access level for the AI insight features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiFeatureLevel {
    Demo,
    Full,
    Unlimited,
}

/// Daily AI request allowance: a count, or `"unlimited"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DailyRequestsRepr", into = "DailyRequestsRepr")]
pub enum DailyRequests {
    Limited(u64),
    Unlimited,
}

impl DailyRequests {
    /// Returns the numeric limit, or `None` when unlimited.
    #[must_use]
    pub fn limit(&self) -> Option<u64> {
        match self {
            Self::Limited(n) => Some(*n),
            Self::Unlimited => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DailyRequestsRepr {
    Count(u64),
    Word(String),
}

impl TryFrom<DailyRequestsRepr> for DailyRequests {
    type Error = String;

    fn try_from(repr: DailyRequestsRepr) -> Result<Self, Self::Error> {
        match repr {
            DailyRequestsRepr::Count(n) => Ok(Self::Limited(n)),
            DailyRequestsRepr::Word(w) if w.eq_ignore_ascii_case("unlimited") => {
                Ok(Self::Unlimited)
            }
            DailyRequestsRepr::Word(w) => Err(format!(
                "dailyRequests must be a number or \"unlimited\", got {w:?}"
            )),
        }
    }
}

impl From<DailyRequests> for DailyRequestsRepr {
    fn from(value: DailyRequests) -> Self {
        match value {
            DailyRequests::Limited(n) => Self::Count(n),
            DailyRequests::Unlimited => Self::Word("unlimited".to_string()),
        }
    }
}

/// The set of capabilities granted by an active license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureEntitlement {
    pub ai_features: AiFeatureLevel,
    pub daily_requests: DailyRequests,
    pub custom_branding: bool,
    pub priority_support: bool,
    pub commercial_use: bool,
    pub multiple_projects: bool,
    pub white_label: bool,
}

impl FeatureEntitlement {
    /// Returns true if the named capability is granted.
    ///
    /// `aiFeatures` is always granted (its level decides how much);
    /// `dailyRequests` is granted unless the allowance is zero.
    #[must_use]
    pub fn allows(&self, feature: Feature) -> bool {
        match feature {
            Feature::AiFeatures => true,
            Feature::DailyRequests => self.daily_requests != DailyRequests::Limited(0),
            Feature::CustomBranding => self.custom_branding,
            Feature::PrioritySupport => self.priority_support,
            Feature::CommercialUse => self.commercial_use,
            Feature::MultipleProjects => self.multiple_projects,
            Feature::WhiteLabel => self.white_label,
        }
    }

    /// Returns the numeric daily request limit, or `None` when unlimited.
    #[must_use]
    pub fn request_limit(&self) -> Option<u64> {
        self.daily_requests.limit()
    }
}

/// A named entitlement flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    AiFeatures,
    DailyRequests,
    CustomBranding,
    PrioritySupport,
    CommercialUse,
    MultipleProjects,
    WhiteLabel,
}

impl Feature {
    /// Every feature, in wire order.
    pub const ALL: [Feature; 7] = [
        Feature::AiFeatures,
        Feature::DailyRequests,
        Feature::CustomBranding,
        Feature::PrioritySupport,
        Feature::CommercialUse,
        Feature::MultipleProjects,
        Feature::WhiteLabel,
    ];

    /// Returns the camelCase wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AiFeatures => "aiFeatures",
            Self::DailyRequests => "dailyRequests",
            Self::CustomBranding => "customBranding",
            Self::PrioritySupport => "prioritySupport",
            Self::CommercialUse => "commercialUse",
            Self::MultipleProjects => "multipleProjects",
            Self::WhiteLabel => "whiteLabel",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = crate::Error;

    /// Accepts the wire name (`customBranding`) or its snake_case form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Feature::ALL
            .into_iter()
            .find(|f| f.as_str().to_ascii_lowercase() == folded)
            .ok_or_else(|| crate::Error::UnknownFeature(s.to_string()))
    }
}
