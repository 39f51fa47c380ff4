//! Error types for the `chapterize` crate.
//!
//! This module defines [`ChapterizeError`], the unified error type returned by
//! all fallible operations in the crate. Variants carry enough context to
//! diagnose a failed capture or navigation without extra logging at the call
//! site.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `chapterize` operations.
///
/// Every public method that can fail returns `Result<T, ChapterizeError>`.
/// Note that most navigation failures are deliberately *not* propagated as
/// errors — see [`PlaybackPositionTracker`](crate::PlaybackPositionTracker),
/// which logs and degrades instead of failing playback.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChapterizeError {
    /// The media duration is unknown; metadata has not loaded.
    ///
    /// Aborts a whole thumbnail batch: without a duration nothing meaningful
    /// can be produced.
    #[error("Media duration is unknown; metadata has not loaded")]
    MetadataUnavailable,

    /// The decoder did not become ready within the configured timeout.
    #[error("Decoder did not become ready within {waited:?}")]
    DecodeTimeout {
        /// How long the capture waited before giving up.
        waited: Duration,
    },

    /// The decoder has no presentable frame at the requested position.
    #[error("Decoder has no presentable frame at the requested position")]
    DecodeNotReady,

    /// A seek did not signal completion within the navigation wait.
    ///
    /// Soft failure: chapter navigation proceeds anyway after this window.
    #[error("Seek did not signal completion within {waited:?}")]
    SeekTimeout {
        /// The bounded wait that elapsed.
        waited: Duration,
    },

    /// The decoder reported a hard failure.
    #[error("Decoder reported a failure: {0}")]
    LoadError(String),

    /// A playback request was rejected (e.g. by an autoplay policy).
    #[error("Playback request was rejected: {0}")]
    PlaybackRejected(String),

    /// The media source could not be opened.
    #[error("Failed to open media source at {path}: {reason}")]
    SourceOpen {
        /// Path that was passed to [`crate::FileElement::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The source does not contain a video stream.
    #[error("No video stream found in source")]
    NoVideoStream,

    /// A chapter count of zero was requested.
    #[error("Chapter count must be at least 1")]
    InvalidChapterCount,

    /// Equal division was requested over a zero or negative duration.
    #[error("Duration must be greater than zero to divide into chapters")]
    InvalidDuration,

    /// Chapter records could not be parsed.
    #[error("Failed to parse chapter records: {0}")]
    ChapterParse(#[from] serde_json::Error),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An error from the `image` crate during scaling or encoding.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),
}

impl From<FfmpegError> for ChapterizeError {
    fn from(error: FfmpegError) -> Self {
        ChapterizeError::FfmpegError(error.to_string())
    }
}
