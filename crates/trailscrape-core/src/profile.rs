//! Profile records as extracted from a public profile page and as persisted
//! in the profile store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// The fixed eight-field structure extracted per identifier.
///
/// Every field is optional so that a partially failed extraction still
/// produces a record: fields are filled in page order and extraction stops at
/// the first hard failure. An extraction that fails before the first field
/// serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badges: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trails: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_image: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "text_or_integer"
    )]
    pub certifications: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "text_or_integer"
    )]
    pub superbadges: Option<String>,
}

impl ProfileRecord {
    /// Returns `true` when no field was extracted at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, value)| value.is_none())
    }

    /// The eight fields in their fixed render order, keyed by fragment label.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, Option<&str>); 8] {
        [
            ("name", self.name.as_deref()),
            ("badges", self.badges.as_deref()),
            ("points", self.points.as_deref()),
            ("trails", self.trails.as_deref()),
            ("leveltext", self.level_text.as_deref()),
            ("levelimage", self.level_image.as_deref()),
            ("certifications", self.certifications.as_deref()),
            ("superbadges", self.superbadges.as_deref()),
        ]
    }
}

/// Outcome of the extraction that produced a stored record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    /// Every required field was read.
    #[default]
    Complete,
    /// Extraction failed after at least one field was read.
    Partial,
    /// Extraction failed before any field was read.
    Failed,
}

impl ExtractionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionStatus::Complete => "complete",
            ExtractionStatus::Partial => "partial",
            ExtractionStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record as held by the store: the record itself plus extraction metadata.
///
/// The record fields are flattened so a store file written by older
/// deployments (bare records, no metadata) still loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProfile {
    #[serde(flatten)]
    pub record: ProfileRecord,
    #[serde(default)]
    pub status: ExtractionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl StoredProfile {
    /// Builds the stored form of a fresh extraction.
    ///
    /// The status is derived from the error and from how far the record got:
    /// no error is `Complete`, an error with some fields is `Partial`, an
    /// error with no fields is `Failed`.
    #[must_use]
    pub fn from_extraction(record: ProfileRecord, error: Option<String>) -> Self {
        let status = match (&error, record.is_empty()) {
            (None, _) => ExtractionStatus::Complete,
            (Some(_), false) => ExtractionStatus::Partial,
            (Some(_), true) => ExtractionStatus::Failed,
        };
        Self {
            record,
            status,
            error,
            refreshed_at: Some(Utc::now()),
        }
    }
}

/// Accepts either a string or a bare integer. Older store files persisted
/// the `0` fallback for certifications and superbadges as a JSON number.
fn text_or_integer<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrInteger {
        Text(String),
        Integer(i64),
    }

    Ok(
        Option::<TextOrInteger>::deserialize(deserializer)?.map(|value| match value {
            TextOrInteger::Text(text) => text,
            TextOrInteger::Integer(n) => n.to_string(),
        }),
    )
}
