//! Scripted in-memory media element for engine tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{DynamicImage, Rgb, RgbImage};
use tokio::sync::broadcast;

use chapterize::{ChapterizeError, MediaElement, MediaEvent, ReadyState};

/// Scripts how the mock decoder behaves.
#[derive(Debug, Clone)]
pub struct MockBehavior {
    /// Reported duration; `None` simulates metadata that never loads.
    pub duration: Option<f64>,
    /// Fire `Seeked` after each seek request.
    pub signal_seeked: bool,
    /// Reach `CanCapture` after a seek (observable by polling).
    pub becomes_ready: bool,
    /// How long a seek "decodes" before readiness arrives. While it runs the
    /// element reports `MetadataLoaded` and still presents the previous
    /// target's frame. `None` completes seeks synchronously.
    pub ready_delay: Option<Duration>,
    /// Every `current_frame` call fails, as a decoder timing out would.
    pub fail_all_frames: bool,
    /// Reject this many `play` calls before accepting.
    pub reject_plays: usize,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            duration: Some(100.0),
            signal_seeked: true,
            becomes_ready: true,
            ready_delay: None,
            fail_all_frames: false,
            reject_plays: 0,
        }
    }
}

struct MockState {
    ready: ReadyState,
    current_time: f64,
    /// Position of the frame the decoder actually holds. Trails
    /// `current_time` while a scripted decode delay is running.
    presented_time: f64,
    paused: bool,
    seeks: Vec<f64>,
}

struct MockInner {
    behavior: MockBehavior,
    events: broadcast::Sender<MediaEvent>,
    state: Mutex<MockState>,
    play_calls: AtomicUsize,
}

pub struct MockElement {
    inner: Arc<MockInner>,
}

impl MockElement {
    pub fn new(behavior: MockBehavior) -> Self {
        let (events, _) = broadcast::channel(64);
        let ready = if behavior.duration.is_some() {
            ReadyState::MetadataLoaded
        } else {
            ReadyState::Idle
        };
        Self {
            inner: Arc::new(MockInner {
                behavior,
                events,
                state: Mutex::new(MockState {
                    ready,
                    current_time: 0.0,
                    presented_time: 0.0,
                    paused: true,
                    seeks: Vec::new(),
                }),
                play_calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Put the element into the playing state without counting a play call.
    pub fn set_playing(&self) {
        self.inner.state.lock().expect("state lock").paused = false;
    }

    /// Every seek target requested so far, in order.
    pub fn seeks(&self) -> Vec<f64> {
        self.inner.state.lock().expect("state lock").seeks.clone()
    }

    /// How many times `play` was requested.
    pub fn play_calls(&self) -> usize {
        self.inner.play_calls.load(Ordering::SeqCst)
    }
}

/// The frame the mock decoder presents for a position: a solid colour whose
/// red channel encodes the (whole-second) position.
pub fn frame_shade(position: f64) -> u8 {
    (position as u32 % 255) as u8
}

fn complete_seek(inner: &MockInner, time: f64) {
    {
        let mut state = inner.state.lock().expect("state lock");
        state.presented_time = time;
        state.ready = ReadyState::CanCapture;
    }
    if inner.behavior.signal_seeked {
        let _ = inner.events.send(MediaEvent::Seeked);
    }
}

impl MediaElement for MockElement {
    fn ready_state(&self) -> ReadyState {
        self.inner.state.lock().expect("state lock").ready
    }

    fn duration(&self) -> Option<f64> {
        self.inner.behavior.duration
    }

    fn current_time(&self) -> f64 {
        self.inner.state.lock().expect("state lock").current_time
    }

    fn set_current_time(&self, time: f64) {
        {
            let mut state = self.inner.state.lock().expect("state lock");
            state.seeks.push(time);
            state.current_time = time;
            // Seeking invalidates the presented frame until the decode lands.
            if state.ready.can_capture() {
                state.ready = ReadyState::MetadataLoaded;
            }
        }
        if !self.inner.behavior.becomes_ready {
            return;
        }
        match self.inner.behavior.ready_delay {
            None => complete_seek(&self.inner, time),
            Some(delay) => {
                let inner = Arc::clone(&self.inner);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    complete_seek(&inner, time);
                });
            }
        }
    }

    fn paused(&self) -> bool {
        self.inner.state.lock().expect("state lock").paused
    }

    fn play(&self) -> impl Future<Output = Result<(), ChapterizeError>> + Send {
        async move {
            let calls_before = self.inner.play_calls.fetch_add(1, Ordering::SeqCst);
            if calls_before < self.inner.behavior.reject_plays {
                return Err(ChapterizeError::PlaybackRejected(
                    "scripted autoplay rejection".to_string(),
                ));
            }
            self.inner.state.lock().expect("state lock").paused = false;
            Ok(())
        }
    }

    fn pause(&self) {
        self.inner.state.lock().expect("state lock").paused = true;
    }

    fn load_metadata(&self) -> impl Future<Output = Result<(), ChapterizeError>> + Send {
        async move { Ok(()) }
    }

    fn subscribe(&self) -> broadcast::Receiver<MediaEvent> {
        self.inner.events.subscribe()
    }

    fn current_frame(&self) -> Result<DynamicImage, ChapterizeError> {
        if self.inner.behavior.fail_all_frames {
            return Err(ChapterizeError::LoadError(
                "scripted decode failure".to_string(),
            ));
        }
        let state = self.inner.state.lock().expect("state lock");
        if !state.ready.can_capture() {
            return Err(ChapterizeError::DecodeNotReady);
        }
        // Solid-colour frame keyed to the decoded position, large enough to
        // scale.
        let shade = frame_shade(state.presented_time);
        let image = RgbImage::from_pixel(64, 36, Rgb([shade, 128, 255 - shade]));
        Ok(DynamicImage::ImageRgb8(image))
    }
}
