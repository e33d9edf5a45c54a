//! License key normalization.
//!
//! Keys look like `PREFIX-SEGMENT-SEGMENT-SEGMENT`, e.g.
//! `AI-DASH-REG-DEMO-2024`. The license service is the only authority on
//! whether a key is genuine; these helpers only clean up user input.

/// Minimum number of segments after the prefix.
pub const MIN_SEGMENTS: usize = 3;

/// Trims a user-entered key. Returns `None` if nothing is left.
#[must_use]
pub fn normalize_key(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Returns true if `key` has the usual `PREFIX-SEG-SEG-SEG` shape.
#[must_use]
pub fn is_well_formed(key: &str) -> bool {
    let parts: Vec<&str> = key.trim().split('-').collect();
    parts.len() > MIN_SEGMENTS
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Masks a key for logging: keeps the prefix and the last four characters.
#[must_use]
pub fn mask_key(key: &str) -> String {
    let key = key.trim();
    let prefix = key.split('-').next().unwrap_or_default();
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if key.chars().count() <= prefix.chars().count() + 4 {
        return "****".to_string();
    }
    format!("{prefix}-****{tail}")
}
