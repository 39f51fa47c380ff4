mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chapterize::{
    CaptureOptions, Chapter, ChapterChangeListener, MediaElement, PlaybackPositionTracker,
    generate_equal,
};
use common::{MockBehavior, MockElement};

struct RecordingListener {
    changes: Mutex<Vec<(usize, String)>>,
}

impl RecordingListener {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            changes: Mutex::new(Vec::new()),
        })
    }

    fn changes(&self) -> Vec<(usize, String)> {
        self.changes.lock().expect("changes lock").clone()
    }
}

impl ChapterChangeListener for RecordingListener {
    fn on_chapter_change(&self, index: usize, chapter: &Chapter) {
        self.changes
            .lock()
            .expect("changes lock")
            .push((index, chapter.title.clone()));
    }
}

fn five_chapters() -> Vec<Chapter> {
    generate_equal(100.0, 5, "Chapter")
        .expect("valid input")
        .iter()
        .map(Chapter::from_definition)
        .collect()
}

#[test]
fn time_updates_move_the_pointer() {
    let mut tracker = PlaybackPositionTracker::new(five_chapters());
    assert_eq!(tracker.current_index(), None);

    tracker.on_time_update(45.0);
    assert_eq!(tracker.current_index(), Some(2));

    tracker.on_time_update(79.999);
    assert_eq!(tracker.current_index(), Some(3));

    tracker.on_time_update(80.0);
    assert_eq!(tracker.current_index(), Some(4));
    assert_eq!(
        tracker.current_chapter().map(|c| c.title.as_str()),
        Some("Chapter 5")
    );
}

#[test]
fn listener_fires_only_when_the_pointer_moves() {
    let listener = RecordingListener::new();
    let mut tracker =
        PlaybackPositionTracker::new(five_chapters()).with_listener(listener.clone());

    tracker.on_time_update(5.0);
    tracker.on_time_update(12.0);
    tracker.on_time_update(19.9);
    tracker.on_time_update(21.0);

    assert_eq!(
        listener.changes(),
        vec![(0, "Chapter 1".to_string()), (1, "Chapter 2".to_string())]
    );
}

#[test]
fn external_changes_match_by_start_time() {
    let listener = RecordingListener::new();
    let mut tracker =
        PlaybackPositionTracker::new(five_chapters()).with_listener(listener.clone());

    tracker.on_external_chapter_change(40.0);
    assert_eq!(tracker.current_index(), Some(2));

    // Float drift within tolerance still matches.
    tracker.on_external_chapter_change(60.0004);
    assert_eq!(tracker.current_index(), Some(3));

    // Unknown start times are ignored.
    tracker.on_external_chapter_change(47.3);
    assert_eq!(tracker.current_index(), Some(3));

    assert_eq!(listener.changes().len(), 2);
}

#[tokio::test]
async fn seek_to_chapter_seeks_resumes_and_updates_the_pointer() {
    let element = MockElement::new(MockBehavior::default());
    let mut tracker = PlaybackPositionTracker::new(five_chapters());

    tracker.seek_to_chapter(&element, 3).await;

    assert_eq!(element.seeks(), vec![60.0]);
    assert!(!element.paused());
    assert_eq!(element.play_calls(), 1);
    assert_eq!(tracker.current_index(), Some(3));
}

#[tokio::test]
async fn a_rejected_play_is_retried_exactly_once() {
    let element = MockElement::new(MockBehavior {
        reject_plays: 1,
        ..MockBehavior::default()
    });
    let mut tracker = PlaybackPositionTracker::new(five_chapters());

    tracker.seek_to_chapter(&element, 1).await;

    assert_eq!(element.play_calls(), 2);
    assert!(!element.paused());
    assert_eq!(tracker.current_index(), Some(1));
}

#[tokio::test]
async fn navigation_proceeds_when_the_seek_never_signals() {
    let element = MockElement::new(MockBehavior {
        signal_seeked: false,
        ..MockBehavior::default()
    });
    let options =
        CaptureOptions::new().with_navigation_seek_timeout(Duration::from_millis(30));
    let mut tracker = PlaybackPositionTracker::new(five_chapters()).with_options(options);

    tracker.seek_to_chapter(&element, 2).await;

    // Pointer is updated optimistically even without a completion signal.
    assert_eq!(tracker.current_index(), Some(2));
    assert_eq!(element.seeks(), vec![40.0]);
}

#[tokio::test]
async fn seeking_to_an_unknown_index_is_a_no_op() {
    let element = MockElement::new(MockBehavior::default());
    let mut tracker = PlaybackPositionTracker::new(five_chapters());

    tracker.seek_to_chapter(&element, 9).await;

    assert_eq!(tracker.current_index(), None);
    assert!(element.seeks().is_empty());
    assert_eq!(element.play_calls(), 0);
}
