//! The media-element capability surface consumed by the engine.
//!
//! [`MediaElement`] abstracts the decoder the engine works against: readiness
//! state, duration, a read/write playback position (writes begin asynchronous
//! seeks), play/pause, and an event feed. The crate ships one concrete
//! implementation, [`FileElement`](crate::FileElement), backed by FFmpeg;
//! hosts embedding the engine against another decode pipeline implement this
//! trait themselves.
//!
//! Events are delivered over a [`tokio::sync::broadcast`] channel. A
//! subscription lives exactly as long as the `Receiver` handed out by
//! [`MediaElement::subscribe`]; dropping it is the guaranteed unsubscription
//! every capture path relies on, success or failure.

use image::DynamicImage;
use tokio::sync::broadcast;

use crate::error::ChapterizeError;

/// Decoder readiness, in the order an element moves through it.
///
/// `CanCapture` is the gate for frame capture: the decoder holds a
/// presentable frame for the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadyState {
    /// Nothing loaded yet.
    #[default]
    Idle,
    /// Duration and stream layout are known; no frame is decoded yet.
    MetadataLoaded,
    /// A decoded frame for the current position is available.
    CanCapture,
    /// The decoder reported an unrecoverable failure.
    Error,
}

impl ReadyState {
    /// Whether metadata (and therefore duration) is available.
    pub fn has_metadata(self) -> bool {
        matches!(self, ReadyState::MetadataLoaded | ReadyState::CanCapture)
    }

    /// Whether the decoder holds a presentable current frame.
    pub fn can_capture(self) -> bool {
        matches!(self, ReadyState::CanCapture)
    }
}

/// Notifications emitted by a media element.
#[derive(Debug, Clone)]
pub enum MediaEvent {
    /// Duration and stream layout became known.
    MetadataLoaded,
    /// Enough data is decoded for playback to begin.
    CanPlay,
    /// A previously requested seek completed.
    Seeked,
    /// The playback position advanced during playback.
    TimeUpdate(f64),
    /// The decoder reported a failure.
    Error(String),
}

/// The decoder surface the capture and navigation engine consumes.
///
/// Implementations must be `Send + Sync`; the engine borrows an element for
/// the duration of a capture or seek and restores its playback state
/// afterwards. The element is a single mutable decode pipeline — callers must
/// not run two captures against the same element concurrently (the
/// [`generator`](crate::generator) enforces this by serializing).
pub trait MediaElement: Send + Sync {
    /// Current readiness of the decode pipeline.
    fn ready_state(&self) -> ReadyState;

    /// Media duration in seconds, available once metadata has loaded.
    fn duration(&self) -> Option<f64>;

    /// Current playback position in seconds.
    fn current_time(&self) -> f64;

    /// Move the playback position. Seeking is asynchronous: completion is
    /// signalled by [`MediaEvent::Seeked`], though a decoder in some
    /// buffering states may never fire it — callers pair this with a bounded
    /// wait and a readiness poll.
    fn set_current_time(&self, time: f64);

    /// Whether playback is currently paused.
    fn paused(&self) -> bool;

    /// Request playback to start or resume. May be rejected
    /// ([`ChapterizeError::PlaybackRejected`]).
    fn play(&self) -> impl Future<Output = Result<(), ChapterizeError>> + Send;

    /// Pause playback. Never fails.
    fn pause(&self);

    /// Begin loading metadata if it is not loaded yet, and wait for it.
    /// Idempotent.
    fn load_metadata(&self) -> impl Future<Output = Result<(), ChapterizeError>> + Send;

    /// Subscribe to the element's event feed. Events sent after this call
    /// are buffered in the receiver; drop the receiver to unsubscribe.
    fn subscribe(&self) -> broadcast::Receiver<MediaEvent>;

    /// Snapshot of the most recently decoded frame.
    ///
    /// # Errors
    ///
    /// [`ChapterizeError::DecodeNotReady`] when no frame has been decoded
    /// yet, [`ChapterizeError::LoadError`] when the decoder is in the error
    /// state.
    fn current_frame(&self) -> Result<DynamicImage, ChapterizeError>;
}
