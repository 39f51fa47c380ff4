//! # chapterize
//!
//! Generate and navigate chapters for a video: determine chapter boundaries
//! (from an external source or by equal time-division), capture a thumbnail
//! per chapter from the decoded stream, and keep a "current chapter" pointer
//! consistent with live playback.
//!
//! The heart of the crate is the capture and synchronization engine — a
//! sequence of asynchronous, timing-sensitive operations against a shared
//! media element: seek to arbitrary timestamps without corrupting playback
//! state, capture a decoded frame despite variable decoder readiness, do so
//! for N chapters sequentially without races, and degrade gracefully when
//! any step fails.
//!
//! ## Quick Start
//!
//! ```no_run
//! use chapterize::{CaptureOptions, FileElement, MediaElement, generate, generate_equal};
//!
//! # async fn example() -> Result<(), chapterize::ChapterizeError> {
//! let element = FileElement::open("input.mp4");
//! element.load_metadata().await?;
//!
//! let duration = element.duration().unwrap_or_default();
//! let definitions = generate_equal(duration, 5, "Chapter")?;
//! let chapters = generate(&element, &definitions, 320, 180, &CaptureOptions::new()).await?;
//!
//! for chapter in &chapters {
//!     println!("{} @ {:.1}s (thumbnail: {})",
//!         chapter.title, chapter.start_time, chapter.thumbnail.is_some());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Tracking playback
//!
//! ```
//! use chapterize::{Chapter, PlaybackPositionTracker, generate_equal};
//!
//! let chapters: Vec<Chapter> = generate_equal(100.0, 5, "Chapter")
//!     .unwrap()
//!     .iter()
//!     .map(Chapter::from_definition)
//!     .collect();
//!
//! let mut tracker = PlaybackPositionTracker::new(chapters);
//! tracker.on_time_update(45.0);
//! assert_eq!(tracker.current_index(), Some(2));
//! ```
//!
//! ## Design
//!
//! - Everything is event-loop-driven: operations suspend at decoder
//!   boundaries and resume on a notification or a timer, and every
//!   suspension is bounded by a timeout ([`CaptureOptions`]).
//! - The media element is the only shared mutable resource; captures are
//!   serialized against it rather than locked.
//! - Per-chapter failure is isolated; navigation failures are logged, never
//!   fatal.
//!
//! ## Requirements
//!
//! The bundled [`FileElement`] needs the FFmpeg development libraries at
//! build time. Engine, tracker, and builders work against any
//! [`MediaElement`] implementation.

pub mod capture;
pub mod chapters;
pub mod element;
pub mod error;
pub mod fallback;
pub mod ffmpeg;
pub mod generator;
pub mod media;
pub mod options;
pub mod source;
pub mod tracker;

pub use capture::{CaptureRequest, ZERO_NUDGE, capture};
pub use chapters::{Chapter, ChapterDefinition, Thumbnail, chapter_index_at, generate_equal};
pub use element::{MediaElement, MediaEvent, ReadyState};
pub use error::ChapterizeError;
pub use fallback::{ThumbnailFallbackService, attach_hints, resolve_thumbnail_failure};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use generator::generate;
pub use media::{FileElement, SourceInfo};
pub use options::CaptureOptions;
pub use source::{ChapterRecord, from_records, records_from_json};
pub use tracker::{ChapterChangeListener, PlaybackPositionTracker};
