//! FFmpeg-backed media element.
//!
//! [`FileElement`] implements [`MediaElement`] over a local file or URL,
//! powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate. All demuxing
//! and decoding happens on one dedicated decode thread that owns the FFmpeg
//! contexts for the element's whole lifetime — seeks reuse the open demuxer
//! and decoder in place, because opening a second decoder against the same
//! resource is more failure-prone and wastes buffering. Commands flow to the
//! thread over a channel; results come back as [`MediaEvent`]s and shared
//! state updates, which keeps CPU-heavy FFmpeg work off the cooperative
//! async runtime.
//!
//! The element does not run a playback clock. `play`/`pause` track the
//! logical playing state; a host that renders frames drives
//! [`PlaybackPositionTracker::on_time_update`]
//! (crate::PlaybackPositionTracker::on_time_update) itself.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver as CommandReceiver, Sender as CommandSender, channel};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    format::Pixel,
    format::context::Input,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};
use tokio::sync::broadcast;

use crate::element::{MediaElement, MediaEvent, ReadyState};
use crate::error::ChapterizeError;
use crate::source::ChapterRecord;

/// Capacity of the event channel. Small: events are signals, not a queue.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Metadata probed from the container when the element opens.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    /// Total duration in seconds.
    pub duration: f64,
    /// Video frame width in pixels.
    pub width: u32,
    /// Video frame height in pixels.
    pub height: u32,
    /// Frames per second (approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Container format name (e.g. `"mp4"`, `"matroska"`).
    pub format: String,
    /// Chapter markers embedded in the container, as external-source
    /// records. Empty when the container carries none.
    pub chapters: Vec<ChapterRecord>,
}

enum DecoderCommand {
    Seek(f64),
}

#[derive(Default)]
struct PlaybackState {
    ready: ReadyState,
    duration: Option<f64>,
    current_time: f64,
    paused: bool,
    frame: Option<DynamicImage>,
    info: Option<SourceInfo>,
}

struct Shared {
    source: PathBuf,
    events: broadcast::Sender<MediaEvent>,
    state: Mutex<PlaybackState>,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, PlaybackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A media element backed by an FFmpeg decode thread.
///
/// Opening is non-blocking: metadata is probed in the background and
/// signalled via [`MediaEvent::MetadataLoaded`]. Await
/// [`load_metadata`](MediaElement::load_metadata) before reading the
/// duration or embedded chapters.
///
/// Clones share the same decode thread; the thread exits when the last
/// clone is dropped.
///
/// # Example
///
/// ```no_run
/// use chapterize::{FileElement, MediaElement};
///
/// # async fn example() -> Result<(), chapterize::ChapterizeError> {
/// let element = FileElement::open("input.mp4");
/// element.load_metadata().await?;
/// println!("duration: {:?}s", element.duration());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FileElement {
    shared: Arc<Shared>,
    commands: CommandSender<DecoderCommand>,
}

impl FileElement {
    /// Open a media source and start its decode thread.
    ///
    /// Never fails directly; open errors surface through
    /// [`load_metadata`](MediaElement::load_metadata) and the event feed.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let (commands, receiver) = channel();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let shared = Arc::new(Shared {
            source: path.as_ref().to_path_buf(),
            events,
            state: Mutex::new(PlaybackState {
                paused: true,
                ..PlaybackState::default()
            }),
        });

        let worker_shared = Arc::clone(&shared);
        let spawned = std::thread::Builder::new()
            .name("chapterize-decode".to_string())
            .spawn(move || run_worker(worker_shared, receiver));
        if let Err(error) = spawned {
            let mut state = shared.lock_state();
            state.ready = ReadyState::Error;
            drop(state);
            let _ = shared
                .events
                .send(MediaEvent::Error(format!("failed to spawn decode thread: {error}")));
        }

        Self { shared, commands }
    }

    /// Metadata probed from the container, once loaded.
    pub fn source_info(&self) -> Option<SourceInfo> {
        self.shared.lock_state().info.clone()
    }
}

impl MediaElement for FileElement {
    fn ready_state(&self) -> ReadyState {
        self.shared.lock_state().ready
    }

    fn duration(&self) -> Option<f64> {
        self.shared.lock_state().duration
    }

    fn current_time(&self) -> f64 {
        self.shared.lock_state().current_time
    }

    fn set_current_time(&self, time: f64) {
        {
            let mut state = self.shared.lock_state();
            state.current_time = time;
            // A queued seek invalidates the presented frame; readiness is
            // restored by the worker once the new target decodes.
            if state.ready.can_capture() {
                state.ready = ReadyState::MetadataLoaded;
            }
            state.frame = None;
        }
        if self.commands.send(DecoderCommand::Seek(time)).is_err() {
            log::debug!("decode thread is gone; seek to {time:.3}s dropped");
        }
    }

    fn paused(&self) -> bool {
        self.shared.lock_state().paused
    }

    fn play(&self) -> impl Future<Output = Result<(), ChapterizeError>> + Send {
        async move {
            let mut state = self.shared.lock_state();
            if matches!(state.ready, ReadyState::Error) {
                return Err(ChapterizeError::PlaybackRejected(
                    "decoder is in the error state".to_string(),
                ));
            }
            state.paused = false;
            Ok(())
        }
    }

    fn pause(&self) {
        self.shared.lock_state().paused = true;
    }

    fn load_metadata(&self) -> impl Future<Output = Result<(), ChapterizeError>> + Send {
        async move {
            let mut events = self.shared.events.subscribe();
            loop {
                {
                    let state = self.shared.lock_state();
                    if state.ready.has_metadata() {
                        return Ok(());
                    }
                    if matches!(state.ready, ReadyState::Error) {
                        return Err(ChapterizeError::LoadError(
                            "media source failed to open".to_string(),
                        ));
                    }
                }
                match events.recv().await {
                    Ok(MediaEvent::MetadataLoaded) => return Ok(()),
                    Ok(MediaEvent::Error(message)) => {
                        return Err(ChapterizeError::LoadError(message));
                    }
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(ChapterizeError::MetadataUnavailable);
                    }
                }
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<MediaEvent> {
        self.shared.events.subscribe()
    }

    fn current_frame(&self) -> Result<DynamicImage, ChapterizeError> {
        let state = self.shared.lock_state();
        if matches!(state.ready, ReadyState::Error) {
            return Err(ChapterizeError::LoadError(
                "decoder is in the error state".to_string(),
            ));
        }
        state.frame.clone().ok_or(ChapterizeError::DecodeNotReady)
    }
}

/// Decode-thread main loop: probe, publish metadata, then serve seeks.
fn run_worker(shared: Arc<Shared>, commands: CommandReceiver<DecoderCommand>) {
    let mut pipeline = match DecodePipeline::open(&shared.source) {
        Ok(pipeline) => pipeline,
        Err(error) => {
            log::warn!("failed to open {}: {error}", shared.source.display());
            shared.lock_state().ready = ReadyState::Error;
            let _ = shared.events.send(MediaEvent::Error(error.to_string()));
            return;
        }
    };

    {
        let mut state = shared.lock_state();
        state.ready = ReadyState::MetadataLoaded;
        state.duration = Some(pipeline.info.duration);
        state.info = Some(pipeline.info.clone());
    }
    let _ = shared.events.send(MediaEvent::MetadataLoaded);
    let _ = shared.events.send(MediaEvent::CanPlay);

    // Exits when every element handle has been dropped.
    while let Ok(command) = commands.recv() {
        match command {
            DecoderCommand::Seek(target) => match pipeline.frame_at(target) {
                Ok(frame) => {
                    {
                        let mut state = shared.lock_state();
                        state.frame = Some(frame);
                        state.ready = ReadyState::CanCapture;
                    }
                    let _ = shared.events.send(MediaEvent::Seeked);
                }
                Err(error) => {
                    log::warn!("decode failed while seeking to {target:.3}s: {error}");
                    let _ = shared.events.send(MediaEvent::Error(error.to_string()));
                }
            },
        }
    }
}

/// The FFmpeg contexts owned by the decode thread.
struct DecodePipeline {
    input: Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ScalingContext,
    stream_index: usize,
    time_base: Rational,
    width: u32,
    height: u32,
    frames_per_second: f64,
    info: SourceInfo,
}

impl DecodePipeline {
    fn open(path: &Path) -> Result<Self, ChapterizeError> {
        ffmpeg_next::init().map_err(|error| ChapterizeError::SourceOpen {
            path: path.to_path_buf(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input = ffmpeg_next::format::input(&path).map_err(|error| {
            ChapterizeError::SourceOpen {
                path: path.to_path_buf(),
                reason: error.to_string(),
            }
        })?;

        let stream_index = input
            .streams()
            .best(Type::Video)
            .map(|stream| stream.index())
            .ok_or(ChapterizeError::NoVideoStream)?;
        let stream = input
            .stream(stream_index)
            .ok_or(ChapterizeError::NoVideoStream)?;
        let time_base = stream.time_base();

        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let decoder = decoder_context.decoder().video()?;
        let width = decoder.width();
        let height = decoder.height();

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            }
        };

        // Container duration is reported in microseconds.
        let duration_microseconds = input.duration();
        let duration = if duration_microseconds > 0 {
            duration_microseconds as f64 / 1_000_000.0
        } else {
            0.0
        };

        let format = input.format().name().to_string();

        // Surface embedded chapter markers as external-source records.
        let mut chapters = Vec::with_capacity(input.nb_chapters() as usize);
        for (index, chapter) in input.chapters().enumerate() {
            let start_time = pts_to_seconds(chapter.start(), chapter.time_base());
            let title = chapter
                .metadata()
                .get("title")
                .map(|title| title.to_string())
                .unwrap_or_else(|| format!("Chapter {}", index + 1));
            chapters.push(ChapterRecord {
                title,
                start_time,
                thumbnail_hint: None,
            });
        }

        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;

        let info = SourceInfo {
            duration,
            width,
            height,
            frames_per_second,
            format,
            chapters,
        };

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            time_base,
            width,
            height,
            frames_per_second,
            info,
        })
    }

    /// Seek and decode forward until a frame at or past `target` appears.
    ///
    /// Seeks land on the nearest keyframe before the target, so decoding
    /// continues from there until the target timestamp is reached.
    fn frame_at(&mut self, target: f64) -> Result<DynamicImage, ChapterizeError> {
        let position = (target * 1_000_000.0) as i64;
        self.input.seek(position, ..position)?;
        // Clear buffered frames from before the seek (and any EOF state).
        self.decoder.flush();

        let half_frame = if self.frames_per_second > 0.0 {
            0.5 / self.frames_per_second
        } else {
            0.0
        };

        let DecodePipeline {
            input,
            decoder,
            scaler,
            stream_index,
            time_base,
            width,
            height,
            ..
        } = self;

        let mut decoded = VideoFrame::empty();
        let mut rgb = VideoFrame::empty();

        for (stream, packet) in input.packets() {
            if stream.index() != *stream_index {
                continue;
            }
            decoder.send_packet(&packet)?;
            while decoder.receive_frame(&mut decoded).is_ok() {
                let pts = decoded.pts().unwrap_or(0);
                if pts_to_seconds(pts, *time_base) + half_frame >= target {
                    scaler.run(&decoded, &mut rgb)?;
                    return frame_to_image(&rgb, *width, *height);
                }
            }
        }

        // Flush: near the end of the stream the target frame may only
        // appear once the decoder is drained.
        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            scaler.run(&decoded, &mut rgb)?;
            return frame_to_image(&rgb, *width, *height);
        }

        Err(ChapterizeError::LoadError(format!(
            "no decodable frame at {target:.3}s"
        )))
    }
}

/// Rescale a PTS value from stream time base to seconds.
fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Convert a scaled RGB24 frame to an [`image::DynamicImage`], stripping
/// FFmpeg's per-row stride padding.
fn frame_to_image(
    rgb_frame: &VideoFrame,
    width: u32,
    height: u32,
) -> Result<DynamicImage, ChapterizeError> {
    let stride = rgb_frame.stride(0);
    let row_bytes = (width as usize) * 3;
    let data = rgb_frame.data(0);

    let buffer = if stride == row_bytes {
        data[..row_bytes * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_bytes * (height as usize));
        for row in 0..(height as usize) {
            let start = row * stride;
            buffer.extend_from_slice(&data[start..start + row_bytes]);
        }
        buffer
    };

    let rgb_image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        ChapterizeError::LoadError(
            "failed to construct RGB image from decoded frame data".to_string(),
        )
    })?;
    Ok(DynamicImage::ImageRgb8(rgb_image))
}
