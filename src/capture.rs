//! Single-frame capture.
//!
//! [`capture`] seeks a shared media element to a timestamp, waits for the
//! decoder to present a frame there, and encodes the frame as a JPEG
//! thumbnail. It is the one operation in the crate that mutates the
//! element's position, and at most one capture may be in flight against a
//! given element at any time — the batch [`generator`](crate::generator)
//! serializes for exactly this reason.
//!
//! Decoder readiness is signalled by a `Seeked` event, but real decoders in
//! some buffering states never fire it. The wait is therefore a race: the
//! notification against a grace timer, with a direct readiness poll as the
//! losing branch's fallback. Every path is bounded by
//! [`CaptureOptions::readiness_timeout`], and the event subscription is
//! owned by the capture future, so whichever exit is taken it is released
//! exactly once.

use image::{DynamicImage, codecs::jpeg::JpegEncoder, imageops::FilterType};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;

use crate::element::{MediaElement, MediaEvent, ReadyState};
use crate::error::ChapterizeError;
use crate::options::CaptureOptions;

/// Offset used instead of an exact 0-second seek.
///
/// Seeking to the very edge of the stream triggers decode errors on the
/// first frame with several demuxers; a tenth of a second in is safe.
pub const ZERO_NUDGE: f64 = 0.1;

/// Margin kept from the end of the stream when clamping capture targets.
const END_EPSILON: f64 = 0.05;

/// One frame-capture invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use]
pub struct CaptureRequest {
    /// Timestamp to capture, in seconds. Clamped into the stream bounds.
    pub at: f64,
    /// Output raster width in pixels.
    pub width: u32,
    /// Output raster height in pixels.
    pub height: u32,
}

impl CaptureRequest {
    /// Create a request.
    pub fn new(at: f64, width: u32, height: u32) -> Self {
        Self { at, width, height }
    }
}

/// Capture a still image of the decoded frame at (approximately) the
/// requested timestamp.
///
/// Temporarily mutates the element's current time; never starts or stops
/// playback. The element is reused in place — no second decoder is opened
/// against the resource.
///
/// # Errors
///
/// - [`ChapterizeError::MetadataUnavailable`] when the duration is unknown.
/// - [`ChapterizeError::DecodeTimeout`] when readiness never arrives within
///   the overall timeout.
/// - [`ChapterizeError::DecodeNotReady`] / [`ChapterizeError::LoadError`]
///   when the decoder cannot present a frame.
///
/// # Example
///
/// ```no_run
/// use chapterize::{CaptureOptions, CaptureRequest, FileElement, MediaElement, capture};
///
/// # async fn example() -> Result<(), chapterize::ChapterizeError> {
/// let element = FileElement::open("input.mp4");
/// element.load_metadata().await?;
/// let jpeg = capture(
///     &element,
///     CaptureRequest::new(30.0, 320, 180),
///     &CaptureOptions::new(),
/// )
/// .await?;
/// std::fs::write("thumb.jpg", jpeg)?;
/// # Ok(())
/// # }
/// ```
pub async fn capture<E: MediaElement>(
    element: &E,
    request: CaptureRequest,
    options: &CaptureOptions,
) -> Result<Vec<u8>, ChapterizeError> {
    match tokio::time::timeout(
        options.readiness_timeout,
        capture_inner(element, request, options),
    )
    .await
    {
        Ok(result) => result,
        // The inner future (and its event subscription) is dropped here.
        Err(_) => Err(ChapterizeError::DecodeTimeout {
            waited: options.readiness_timeout,
        }),
    }
}

async fn capture_inner<E: MediaElement>(
    element: &E,
    request: CaptureRequest,
    options: &CaptureOptions,
) -> Result<Vec<u8>, ChapterizeError> {
    let duration = element
        .duration()
        .ok_or(ChapterizeError::MetadataUnavailable)?;
    let target = clamp_target(request.at, duration);

    // Subscribe before seeking so a fast completion is not missed.
    let mut events = element.subscribe();
    log::debug!("capturing frame at {target:.3}s (requested {:.3}s)", request.at);
    element.set_current_time(target);

    wait_for_seek(element, &mut events, options).await?;
    drop(events);

    // Readiness arrived; give the decoder a moment to actually present.
    tokio::time::sleep(options.settle_delay).await;

    let frame = element.current_frame()?;
    encode_thumbnail(&frame, request.width, request.height, options.jpeg_quality)
}

/// Clamp a capture target into `[0, duration - epsilon)`, nudging an exact
/// zero to [`ZERO_NUDGE`] when the duration permits.
fn clamp_target(at: f64, duration: f64) -> f64 {
    let upper = (duration - END_EPSILON).max(0.0);
    let clamped = at.clamp(0.0, upper);
    if clamped == 0.0 && duration > ZERO_NUDGE {
        ZERO_NUDGE
    } else {
        clamped
    }
}

/// Suspend until the seek completes or the decoder is ready.
///
/// Races the `Seeked` notification against the grace timer; when the timer
/// wins, polls `ready_state` directly. The loop is unbounded here because
/// [`capture`] bounds the whole operation.
async fn wait_for_seek<E: MediaElement>(
    element: &E,
    events: &mut Receiver<MediaEvent>,
    options: &CaptureOptions,
) -> Result<(), ChapterizeError> {
    let waited = tokio::time::timeout(options.seek_grace, async {
        loop {
            match events.recv().await {
                Ok(MediaEvent::Seeked) => return Ok(()),
                Ok(MediaEvent::Error(message)) => {
                    return Err(ChapterizeError::LoadError(message));
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    // A Seeked may have been among the skipped events; the
                    // readiness check below covers it.
                    log::debug!("event receiver lagged by {skipped}");
                    if element.ready_state().can_capture() {
                        return Ok(());
                    }
                }
                Err(RecvError::Closed) => return Err(ChapterizeError::DecodeNotReady),
            }
        }
    })
    .await;

    match waited {
        Ok(result) => result,
        Err(_) => {
            log::debug!(
                "no seek completion within {:?}; polling decoder readiness",
                options.seek_grace
            );
            loop {
                match element.ready_state() {
                    ReadyState::CanCapture => return Ok(()),
                    ReadyState::Error => {
                        return Err(ChapterizeError::LoadError(
                            "decoder entered the error state".to_string(),
                        ));
                    }
                    ReadyState::Idle | ReadyState::MetadataLoaded => {}
                }
                tokio::time::sleep(options.poll_interval).await;
            }
        }
    }
}

/// Scale a decoded frame to the requested raster size and encode it as JPEG.
fn encode_thumbnail(
    frame: &DynamicImage,
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, ChapterizeError> {
    let scaled = frame
        .resize_exact(width.max(1), height.max(1), FilterType::Triangle)
        .to_rgb8();
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    encoder.encode_image(&scaled)?;
    Ok(bytes)
}
