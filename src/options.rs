//! Capture and navigation tuning.
//!
//! [`CaptureOptions`] is a builder that threads timeouts, pacing delays, and
//! output settings through the capture engine without polluting every
//! function signature. Defaults match what proved reliable against flaky
//! decoders; none of the delays are correctness-critical.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use chapterize::CaptureOptions;
//!
//! let options = CaptureOptions::new()
//!     .with_inter_capture_delay(Duration::from_millis(200))
//!     .with_jpeg_quality(90);
//! ```

use std::time::Duration;

/// Settings for frame capture and chapter navigation.
///
/// All waits in the engine are bounded by one of these fields. A
/// default-constructed value is suitable for real media.
#[derive(Debug, Clone)]
#[must_use]
pub struct CaptureOptions {
    /// Overall bound on a single capture, covering the seek wait, the
    /// readiness poll, and the settle delay. Defaults to 12 s.
    pub readiness_timeout: Duration,
    /// How long to wait for a `Seeked` notification before falling back to
    /// polling decoder readiness directly. Defaults to 1 s.
    pub seek_grace: Duration,
    /// Interval between readiness polls once the grace window has elapsed.
    /// Defaults to 250 ms.
    pub poll_interval: Duration,
    /// Delay after readiness before the frame is rasterised, so the decoded
    /// frame is actually presentable. Defaults to 150 ms.
    pub settle_delay: Duration,
    /// Pause between consecutive captures in a batch, letting the previous
    /// seek fully settle. Defaults to 300 ms.
    pub inter_capture_delay: Duration,
    /// Bounded wait for seek completion during chapter navigation.
    /// Navigation proceeds anyway when it elapses. Defaults to 500 ms.
    pub navigation_seek_timeout: Duration,
    /// JPEG quality for encoded thumbnails (1–100). Defaults to 80.
    pub jpeg_quality: u8,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureOptions {
    /// Create options with the default timings.
    pub fn new() -> Self {
        Self {
            readiness_timeout: Duration::from_secs(12),
            seek_grace: Duration::from_secs(1),
            poll_interval: Duration::from_millis(250),
            settle_delay: Duration::from_millis(150),
            inter_capture_delay: Duration::from_millis(300),
            navigation_seek_timeout: Duration::from_millis(500),
            jpeg_quality: 80,
        }
    }

    /// Set the overall per-capture timeout.
    pub fn with_readiness_timeout(mut self, timeout: Duration) -> Self {
        self.readiness_timeout = timeout;
        self
    }

    /// Set the seek-notification grace window.
    pub fn with_seek_grace(mut self, grace: Duration) -> Self {
        self.seek_grace = grace;
        self
    }

    /// Set the readiness poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the post-seek settle delay.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Set the pacing delay between captures in a batch.
    pub fn with_inter_capture_delay(mut self, delay: Duration) -> Self {
        self.inter_capture_delay = delay;
        self
    }

    /// Set the bounded seek wait used by chapter navigation.
    pub fn with_navigation_seek_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_seek_timeout = timeout;
        self
    }

    /// Set the JPEG quality for encoded thumbnails. Clamped to 1–100.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }
}
