//! Batch thumbnail generation.
//!
//! [`generate`] walks a list of chapter definitions and captures one
//! thumbnail per chapter against a shared media element. Captures are
//! strictly sequential — the element is a single decode pipeline with one
//! `current_time`, and concurrent seeks would race and produce frames for
//! the wrong timestamps. A short pacing delay between captures lets each
//! seek settle before the next one begins.
//!
//! Failure is per-chapter: a chapter whose capture fails keeps
//! `thumbnail: None` and the batch continues. Only a missing duration
//! aborts the whole batch.

use crate::capture::{CaptureRequest, capture};
use crate::chapters::{Chapter, ChapterDefinition, Thumbnail};
use crate::element::{MediaElement, MediaEvent};
use crate::error::ChapterizeError;
use crate::options::CaptureOptions;

/// Generate one thumbnail per chapter definition.
///
/// Preserves the element's playback state: a playing element is paused for
/// the duration of the batch and resumed afterwards, and the position is
/// reset to 0 when the batch ends. The result has exactly the length and
/// order of `definitions`, regardless of how many captures failed.
///
/// # Errors
///
/// [`ChapterizeError::MetadataUnavailable`] when the element never reports
/// a duration — nothing meaningful can be produced without one. Individual
/// capture failures are logged and isolated, never returned.
///
/// # Example
///
/// ```no_run
/// use chapterize::{CaptureOptions, FileElement, MediaElement, generate, generate_equal};
///
/// # async fn example() -> Result<(), chapterize::ChapterizeError> {
/// let element = FileElement::open("input.mp4");
/// element.load_metadata().await?;
/// let duration = element.duration().unwrap_or_default();
/// let definitions = generate_equal(duration, 5, "Chapter")?;
/// let chapters = generate(&element, &definitions, 320, 180, &CaptureOptions::new()).await?;
/// assert_eq!(chapters.len(), 5);
/// # Ok(())
/// # }
/// ```
pub async fn generate<E: MediaElement>(
    element: &E,
    definitions: &[ChapterDefinition],
    width: u32,
    height: u32,
    options: &CaptureOptions,
) -> Result<Vec<Chapter>, ChapterizeError> {
    wait_for_metadata(element, options).await?;

    let was_playing = !element.paused();
    if was_playing {
        element.pause();
    }

    let mut chapters = Vec::with_capacity(definitions.len());
    for (index, definition) in definitions.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(options.inter_capture_delay).await;
        }

        let request = CaptureRequest::new(definition.start_time, width, height);
        let mut chapter = Chapter::from_definition(definition);
        match capture(element, request, options).await {
            Ok(bytes) => chapter.thumbnail = Some(Thumbnail::Captured(bytes)),
            Err(error) => {
                log::warn!(
                    "thumbnail capture failed for {:?} at {:.3}s: {error}",
                    definition.title,
                    definition.start_time
                );
            }
        }
        chapters.push(chapter);
    }

    // Hand the element back the way we found it.
    element.set_current_time(0.0);
    if was_playing {
        if let Err(error) = element.play().await {
            log::warn!("could not resume playback after thumbnail generation: {error}");
        }
    }

    Ok(chapters)
}

/// Wait until the element has metadata and a known duration.
///
/// Bounded by the readiness timeout; elapsing it means the batch cannot
/// proceed at all.
async fn wait_for_metadata<E: MediaElement>(
    element: &E,
    options: &CaptureOptions,
) -> Result<(), ChapterizeError> {
    let outcome = tokio::time::timeout(options.readiness_timeout, async {
        element.load_metadata().await?;
        if element.ready_state().has_metadata() && element.duration().is_some() {
            return Ok(());
        }

        let mut events = element.subscribe();
        loop {
            if element.ready_state().has_metadata() && element.duration().is_some() {
                return Ok(());
            }
            match events.recv().await {
                Ok(MediaEvent::Error(message)) => {
                    return Err(ChapterizeError::LoadError(message));
                }
                Ok(_) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    return Err(ChapterizeError::MetadataUnavailable);
                }
            }
        }
    })
    .await;

    match outcome {
        Ok(result) => result,
        Err(_) => Err(ChapterizeError::MetadataUnavailable),
    }
}
