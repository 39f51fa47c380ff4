//! External chapter records.
//!
//! When chapters are sourced externally — a chapter service, a sidecar JSON
//! file, or markers embedded in the container — they arrive as
//! [`ChapterRecord`] values and pass through into definitions verbatim: the
//! external source is authoritative for titles and start times.
//!
//! The wire shape is camelCase JSON:
//!
//! ```json
//! [
//!   { "title": "Intro", "startTime": 0.0 },
//!   { "title": "Setup", "startTime": 42.5, "thumbnailHint": "https://cdn/1.jpg" }
//! ]
//! ```

use serde::{Deserialize, Serialize};

use crate::chapters::ChapterDefinition;
use crate::error::ChapterizeError;

/// One chapter as supplied by an external source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRecord {
    /// Chapter title.
    pub title: String,
    /// Start of the chapter in seconds.
    pub start_time: f64,
    /// Optional remote image reference supplied by the source, used as the
    /// chapter's fallback thumbnail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_hint: Option<String>,
}

/// Parse chapter records from a JSON array.
///
/// # Errors
///
/// [`ChapterizeError::ChapterParse`] when the document is not a valid record
/// array.
pub fn records_from_json(json: &str) -> Result<Vec<ChapterRecord>, ChapterizeError> {
    Ok(serde_json::from_str(json)?)
}

/// Pass external records through into chapter definitions, verbatim and in
/// the order given. The source is responsible for ordering; nothing here
/// sorts or filters.
pub fn from_records(records: &[ChapterRecord]) -> Vec<ChapterDefinition> {
    records
        .iter()
        .map(|record| ChapterDefinition {
            title: record.title.clone(),
            start_time: record.start_time,
        })
        .collect()
}
