//! Thumbnail fallback handling.
//!
//! Two collaborators can stand in when frame capture produced nothing, or
//! when a displayed thumbnail later fails to load at render time: the
//! `thumbnailHint` carried by external chapter records, and a
//! [`ThumbnailFallbackService`] that knows a best-effort representative
//! image for the whole video.
//!
//! The swap order on a load failure mirrors the degradation ladder: the
//! chapter's own fallback reference first, the service's representative
//! image as the last resort, otherwise no thumbnail at all.

use crate::chapters::{Chapter, START_TIME_TOLERANCE, Thumbnail};
use crate::source::ChapterRecord;

/// External service producing a best-effort representative still for a
/// media identifier.
///
/// Implementations typically call out to a network thumbnail service; the
/// engine only consumes the returned URL.
pub trait ThumbnailFallbackService: Send + Sync {
    /// A representative image URL for the given media identifier, if the
    /// service knows one.
    fn representative_image_url(&self, media_id: &str) -> Option<String>;
}

/// Attach `thumbnailHint` references from external records to the matching
/// chapters as fallback thumbnails. Matching is by start time.
pub fn attach_hints(chapters: &mut [Chapter], records: &[ChapterRecord]) {
    for record in records {
        let Some(hint) = &record.thumbnail_hint else {
            continue;
        };
        if let Some(chapter) = chapters
            .iter_mut()
            .find(|c| (c.start_time - record.start_time).abs() < START_TIME_TOLERANCE)
        {
            chapter.fallback_thumbnail = Some(hint.clone());
        }
    }
}

/// React to a displayed thumbnail failing to load.
///
/// Swaps the chapter's thumbnail to its fallback reference when one exists,
/// otherwise to the service's representative image, otherwise clears it.
/// The fallback reference is consumed so a second failure walks further
/// down the ladder instead of looping.
pub fn resolve_thumbnail_failure(
    chapter: &mut Chapter,
    service: Option<&dyn ThumbnailFallbackService>,
    media_id: &str,
) {
    if let Some(reference) = chapter.fallback_thumbnail.take() {
        log::debug!(
            "thumbnail for {:?} failed to load; using fallback reference",
            chapter.title
        );
        chapter.thumbnail = Some(Thumbnail::Remote(reference));
        return;
    }

    match service.and_then(|s| s.representative_image_url(media_id)) {
        Some(url) => {
            log::debug!(
                "thumbnail for {:?} failed to load; using service image",
                chapter.title
            );
            chapter.thumbnail = Some(Thumbnail::Remote(url));
        }
        None => {
            log::debug!("thumbnail for {:?} failed to load; none left", chapter.title);
            chapter.thumbnail = None;
        }
    }
}
