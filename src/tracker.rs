//! Playback position tracking and chapter navigation.
//!
//! [`PlaybackPositionTracker`] keeps a "current chapter" pointer consistent
//! with live playback. Two event sources drive it: continuous time updates
//! from the host (recomputed through the half-open-interval rule) and, when
//! chapters come from an external source, direct chapter-change
//! notifications matched by start time. [`seek_to_chapter`]
//! (PlaybackPositionTracker::seek_to_chapter) is the user-facing jump: seek,
//! bounded wait, resume playback, optimistic pointer update.
//!
//! Navigation never fails: decoder errors along the way are logged and the
//! pointer simply stops moving. The worst observable outcome is a chapter
//! button that does not visibly change the position.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use crate::chapters::{Chapter, START_TIME_TOLERANCE, chapter_index_at};
use crate::element::{MediaElement, MediaEvent};
use crate::error::ChapterizeError;
use crate::options::CaptureOptions;

/// Receiver for outbound chapter-change notifications.
///
/// Invoked whenever the current chapter pointer changes, with the new index
/// and chapter — typically consumed by a chapter-list UI to highlight the
/// active entry. Implementations must be `Send + Sync` and must not block;
/// they observe but cannot veto the change.
pub trait ChapterChangeListener: Send + Sync {
    /// Called after the current chapter changed.
    fn on_chapter_change(&self, index: usize, chapter: &Chapter);
}

/// Default listener that discards all notifications.
struct NoOpListener;

impl ChapterChangeListener for NoOpListener {
    fn on_chapter_change(&self, _index: usize, _chapter: &Chapter) {}
}

/// Maps live playback time to "which chapter are we in" and coordinates
/// chapter jumps.
///
/// One tracker lives for one playback session. The chapter list is fixed at
/// construction; the pointer starts at "none" until the first time update.
pub struct PlaybackPositionTracker {
    chapters: Vec<Chapter>,
    current: Option<usize>,
    listener: Arc<dyn ChapterChangeListener>,
    options: CaptureOptions,
}

impl PlaybackPositionTracker {
    /// Create a tracker over an ordered chapter list.
    #[must_use]
    pub fn new(chapters: Vec<Chapter>) -> Self {
        Self {
            chapters,
            current: None,
            listener: Arc::new(NoOpListener),
            options: CaptureOptions::new(),
        }
    }

    /// Attach a chapter-change listener.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn ChapterChangeListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Override the navigation timing options.
    #[must_use]
    pub fn with_options(mut self, options: CaptureOptions) -> Self {
        self.options = options;
        self
    }

    /// The tracked chapters, in order.
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Index of the chapter currently playing, if any.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The chapter currently playing, if any.
    pub fn current_chapter(&self) -> Option<&Chapter> {
        self.current.and_then(|index| self.chapters.get(index))
    }

    /// Feed a live playback position.
    ///
    /// Recomputes the pointer as the greatest chapter whose start time is at
    /// or before `time`. The listener fires only when the pointer actually
    /// moves.
    pub fn on_time_update(&mut self, time: f64) {
        let next = chapter_index_at(&self.chapters, time);
        if next != self.current {
            self.set_current(next);
        }
    }

    /// Feed an external chapter-change notification.
    ///
    /// Only meaningful when chapters are sourced externally: the notified
    /// chapter is matched by start time and the pointer set directly,
    /// bypassing recomputation. Unknown start times are logged and ignored.
    pub fn on_external_chapter_change(&mut self, start_time: f64) {
        let found = self
            .chapters
            .iter()
            .position(|c| (c.start_time - start_time).abs() < START_TIME_TOLERANCE);
        match found {
            Some(index) => {
                if self.current != Some(index) {
                    self.set_current(Some(index));
                }
            }
            None => {
                log::debug!("external chapter change for unknown start time {start_time:.3}s");
            }
        }
    }

    /// Jump playback to the start of a chapter.
    ///
    /// Seeks the element, waits for completion for at most the navigation
    /// timeout (proceeding anyway when the decoder fails to signal), then
    /// requests playback to resume. A rejected play is retried exactly once.
    /// The pointer is updated optimistically — before the next time update
    /// confirms it.
    ///
    /// All element failures are logged rather than returned; chapter
    /// navigation degrades instead of crashing playback.
    pub async fn seek_to_chapter<E: MediaElement>(&mut self, element: &E, index: usize) {
        let Some(chapter) = self.chapters.get(index) else {
            log::warn!("seek requested for unknown chapter index {index}");
            return;
        };
        let start_time = chapter.start_time;

        let mut events = element.subscribe();
        log::debug!("seeking to chapter {index} ({:?}) at {start_time:.3}s", chapter.title);
        element.set_current_time(start_time);

        let waited = tokio::time::timeout(self.options.navigation_seek_timeout, async {
            loop {
                match events.recv().await {
                    Ok(MediaEvent::Seeked) => return,
                    Ok(MediaEvent::Error(message)) => {
                        log::warn!("decoder error during chapter seek: {message}");
                        return;
                    }
                    Ok(_) => continue,
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => return,
                }
            }
        })
        .await;
        if waited.is_err() {
            // Best effort: do not block navigation on a decoder that never
            // signals completion.
            let timeout = ChapterizeError::SeekTimeout {
                waited: self.options.navigation_seek_timeout,
            };
            log::debug!("{timeout}; proceeding with navigation");
        }
        drop(events);

        if let Err(error) = element.play().await {
            log::warn!("play rejected after chapter seek: {error}; retrying once");
            if let Err(error) = element.play().await {
                log::warn!("play retry failed: {error}");
            }
        }

        if self.current != Some(index) {
            self.set_current(Some(index));
        }
    }

    fn set_current(&mut self, next: Option<usize>) {
        self.current = next;
        if let Some(index) = next {
            if let Some(chapter) = self.chapters.get(index) {
                self.listener.on_chapter_change(index, chapter);
            }
        }
    }
}
