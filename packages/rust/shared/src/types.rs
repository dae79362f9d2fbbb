//! Core domain types for ReportDesk fragments and sections.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{ReportDeskError, Result};

// ---------------------------------------------------------------------------
// Fragment
// ---------------------------------------------------------------------------

/// One section's JSON contribution to the report.
///
/// Stored on disk as `<sectionId>_<suffix>.json`. Several fragments may share
/// a `section_id` — they are revisions of the same section, and the loader
/// always selects the most recently modified one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    /// Stable identifier grouping all revisions of one report section.
    #[serde(rename = "sectionId")]
    pub section_id: String,

    /// Contributor name, free text. Only meaningful together with
    /// `timestamp`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// ISO-8601 datetime set by the producer, not by this system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Field identifier → field value. Values are trusted render-safe text.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl Fragment {
    /// The `(author, timestamp)` pair, present only when both are set.
    pub fn metadata(&self) -> Option<(&str, &str)> {
        match (self.author.as_deref(), self.timestamp.as_deref()) {
            (Some(author), Some(ts)) => Some((author, ts)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// SectionEntry
// ---------------------------------------------------------------------------

/// One row of the section table: a known report section and the short prefix
/// token used by its metadata spans in the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionEntry {
    /// Section identifier, matching fragment `sectionId` values.
    pub id: String,
    /// Short token used in `<prefix>-author` / `<prefix>-date` span ids.
    pub prefix: String,
    /// Human-readable section title.
    pub title: String,
}

/// Resolve the metadata-span prefix for a section id.
///
/// Unknown sections fall back to the section id itself, so templates may use
/// full ids for sections not in the table.
pub fn section_prefix<'a>(table: &'a [SectionEntry], section_id: &'a str) -> &'a str {
    table
        .iter()
        .find(|e| e.id == section_id)
        .map(|e| e.prefix.as_str())
        .unwrap_or(section_id)
}

// ---------------------------------------------------------------------------
// Timestamp handling
// ---------------------------------------------------------------------------

/// Accepted layouts for producer-set fragment timestamps, tried in order
/// after RFC 3339.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parse a fragment's `timestamp` field.
///
/// Producers emit ISO-8601 with or without a UTC offset. An unparsable value
/// is a hard error for the fragment carrying it.
pub fn parse_fragment_timestamp(raw: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_local());
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt);
        }
    }

    Err(ReportDeskError::parse(format!(
        "unparsable fragment timestamp: {raw:?}"
    )))
}

/// Format a parsed timestamp the way metadata spans display it.
pub fn format_metadata_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}
