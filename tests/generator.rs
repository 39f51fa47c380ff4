mod common;

use std::time::Duration;

use chapterize::{CaptureOptions, ChapterizeError, MediaElement, Thumbnail, generate, generate_equal};
use common::{MockBehavior, MockElement};

fn fast_options() -> CaptureOptions {
    CaptureOptions::new()
        .with_readiness_timeout(Duration::from_millis(200))
        .with_seek_grace(Duration::from_millis(30))
        .with_poll_interval(Duration::from_millis(5))
        .with_settle_delay(Duration::from_millis(1))
        .with_inter_capture_delay(Duration::from_millis(1))
}

#[tokio::test]
async fn one_chapter_in_one_chapter_out_in_order() {
    let element = MockElement::new(MockBehavior::default());
    let definitions = generate_equal(100.0, 5, "Chapter").expect("valid input");

    let chapters = generate(&element, &definitions, 160, 90, &fast_options())
        .await
        .expect("batch succeeds");

    assert_eq!(chapters.len(), definitions.len());
    for (chapter, definition) in chapters.iter().zip(&definitions) {
        assert_eq!(chapter.title, definition.title);
        assert_eq!(chapter.start_time, definition.start_time);
        assert!(matches!(chapter.thumbnail, Some(Thumbnail::Captured(_))));
    }
}

#[tokio::test]
async fn failed_captures_leave_chapters_without_thumbnails() {
    let element = MockElement::new(MockBehavior {
        fail_all_frames: true,
        ..MockBehavior::default()
    });
    let definitions = generate_equal(100.0, 4, "Chapter").expect("valid input");

    let chapters = generate(&element, &definitions, 160, 90, &fast_options())
        .await
        .expect("batch survives per-chapter failures");

    assert_eq!(chapters.len(), 4);
    assert!(chapters.iter().all(|c| c.thumbnail.is_none()));
    // The failed chapters still carry their definitions.
    assert_eq!(chapters[3].title, "Chapter 4");
}

#[tokio::test]
async fn position_is_reset_after_the_batch() {
    let element = MockElement::new(MockBehavior::default());
    let definitions = generate_equal(100.0, 3, "Chapter").expect("valid input");

    generate(&element, &definitions, 160, 90, &fast_options())
        .await
        .expect("batch succeeds");

    assert_eq!(element.current_time(), 0.0);
    assert_eq!(element.seeks().last(), Some(&0.0));
}

#[tokio::test]
async fn a_playing_element_is_resumed_afterwards() {
    let element = MockElement::new(MockBehavior::default());
    element.set_playing();
    let definitions = generate_equal(100.0, 2, "Chapter").expect("valid input");

    generate(&element, &definitions, 160, 90, &fast_options())
        .await
        .expect("batch succeeds");

    assert!(!element.paused());
    assert_eq!(element.play_calls(), 1);
}

#[tokio::test]
async fn a_paused_element_stays_paused() {
    let element = MockElement::new(MockBehavior::default());
    let definitions = generate_equal(100.0, 2, "Chapter").expect("valid input");

    generate(&element, &definitions, 160, 90, &fast_options())
        .await
        .expect("batch succeeds");

    assert!(element.paused());
    assert_eq!(element.play_calls(), 0);
}

#[tokio::test]
async fn missing_metadata_aborts_the_whole_batch() {
    let element = MockElement::new(MockBehavior {
        duration: None,
        ..MockBehavior::default()
    });
    let definitions = generate_equal(100.0, 3, "Chapter").expect("valid input");

    let options = fast_options().with_readiness_timeout(Duration::from_millis(50));
    let result = generate(&element, &definitions, 160, 90, &options).await;

    assert!(matches!(result, Err(ChapterizeError::MetadataUnavailable)));
    assert!(element.seeks().is_empty());
}
