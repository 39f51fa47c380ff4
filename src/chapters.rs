//! Chapter data model and definition building.
//!
//! A [`ChapterDefinition`] names a segment of a video by its start time.
//! Definitions come from one of two builder modes: pass-through from an
//! external source (see [`crate::source`]) or synthetic equal division of a
//! known duration via [`generate_equal`]. The
//! [`generator`](crate::generator) turns definitions into [`Chapter`] values
//! carrying thumbnails.
//!
//! Definitions are ordered by start time ascending. The caller supplies them
//! in order; nothing here sorts.

use crate::error::ChapterizeError;

/// Tolerance for matching chapters by start time.
///
/// External chapter-change notifications carry a start time rather than an
/// index; timestamps that survived a float round-trip still match within
/// this window.
pub(crate) const START_TIME_TOLERANCE: f64 = 1e-3;

/// A named, ordered segment of a video defined by its start time.
///
/// Immutable once produced. `start_time` is in seconds and must satisfy
/// `0 <= start_time < duration` once the media duration is known; the last
/// chapter's effective end is the duration itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterDefinition {
    /// Human-readable chapter title.
    pub title: String,
    /// Start of the chapter in seconds.
    pub start_time: f64,
}

impl ChapterDefinition {
    /// Create a definition.
    pub fn new(title: impl Into<String>, start_time: f64) -> Self {
        Self {
            title: title.into(),
            start_time,
        }
    }
}

/// A chapter's visual, either captured locally or referenced remotely.
#[derive(Debug, Clone, PartialEq)]
pub enum Thumbnail {
    /// Encoded JPEG bytes captured from the decoder.
    Captured(Vec<u8>),
    /// A remote image reference (fallback services, thumbnail hints).
    Remote(String),
}

/// A chapter definition plus its generated thumbnail state.
///
/// Produced by [`generate`](crate::generator::generate). After generation the
/// only mutation is the fallback swap in [`crate::fallback`], which replaces
/// a thumbnail that failed to load at render time.
#[derive(Debug, Clone)]
pub struct Chapter {
    /// Human-readable chapter title.
    pub title: String,
    /// Start of the chapter in seconds.
    pub start_time: f64,
    /// The thumbnail to display, if any capture or fallback succeeded.
    pub thumbnail: Option<Thumbnail>,
    /// A reserve image reference to swap in when the displayed thumbnail
    /// fails to load.
    pub fallback_thumbnail: Option<String>,
}

impl Chapter {
    /// Build a chapter from its definition with no thumbnail yet.
    pub fn from_definition(definition: &ChapterDefinition) -> Self {
        Self {
            title: definition.title.clone(),
            start_time: definition.start_time,
            thumbnail: None,
            fallback_thumbnail: None,
        }
    }
}

/// Synthesize `count` equally sized chapters spanning `[0, duration)`.
///
/// Chapter `i` starts at `i * duration / count` and is titled
/// `"{prefix} {i+1}"`. Used when no external chapter source is available.
///
/// # Errors
///
/// [`ChapterizeError::InvalidChapterCount`] when `count` is zero,
/// [`ChapterizeError::InvalidDuration`] when `duration` is not positive.
///
/// # Example
///
/// ```
/// use chapterize::generate_equal;
///
/// let chapters = generate_equal(100.0, 5, "Chapter").unwrap();
/// assert_eq!(chapters.len(), 5);
/// assert_eq!(chapters[2].start_time, 40.0);
/// assert_eq!(chapters[2].title, "Chapter 3");
/// ```
pub fn generate_equal(
    duration: f64,
    count: usize,
    prefix: &str,
) -> Result<Vec<ChapterDefinition>, ChapterizeError> {
    if count == 0 {
        return Err(ChapterizeError::InvalidChapterCount);
    }
    if !(duration > 0.0) {
        return Err(ChapterizeError::InvalidDuration);
    }

    let step = duration / count as f64;
    Ok((0..count)
        .map(|index| ChapterDefinition {
            title: format!("{prefix} {}", index + 1),
            start_time: index as f64 * step,
        })
        .collect())
}

/// Find which chapter a playback time falls into.
///
/// Chapters partition `[0, duration)` into half-open intervals
/// `[chapters[i].start_time, chapters[i+1].start_time)`: the result is the
/// greatest `i` with `chapters[i].start_time <= time`, or `None` when the
/// time lies before the first chapter. Assumes the slice is ordered by start
/// time ascending.
pub fn chapter_index_at(chapters: &[Chapter], time: f64) -> Option<usize> {
    chapters
        .iter()
        .rposition(|chapter| chapter.start_time <= time)
}
