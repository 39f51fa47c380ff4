use chapterize::{
    Chapter, ChapterRecord, Thumbnail, ThumbnailFallbackService, attach_hints, from_records,
    records_from_json, resolve_thumbnail_failure,
};

struct FixedService(Option<String>);

impl ThumbnailFallbackService for FixedService {
    fn representative_image_url(&self, _media_id: &str) -> Option<String> {
        self.0.clone()
    }
}

fn record(title: &str, start_time: f64, hint: Option<&str>) -> ChapterRecord {
    ChapterRecord {
        title: title.to_string(),
        start_time,
        thumbnail_hint: hint.map(str::to_string),
    }
}

#[test]
fn records_parse_from_camel_case_json() {
    let json = r#"[
        { "title": "Intro", "startTime": 0.0 },
        { "title": "Setup", "startTime": 42.5, "thumbnailHint": "https://cdn/1.jpg" }
    ]"#;

    let records = records_from_json(json).expect("valid document");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title, "Intro");
    assert!(records[0].thumbnail_hint.is_none());
    assert_eq!(records[1].start_time, 42.5);
    assert_eq!(records[1].thumbnail_hint.as_deref(), Some("https://cdn/1.jpg"));
}

#[test]
fn malformed_records_are_rejected() {
    assert!(records_from_json("{\"title\": \"not an array\"}").is_err());
    assert!(records_from_json("[{\"startTime\": 1.0}]").is_err());
}

#[test]
fn definitions_pass_through_records_verbatim() {
    let records = vec![
        record("Outro", 90.0, None),
        record("Intro", 0.0, Some("https://cdn/0.jpg")),
    ];

    let definitions = from_records(&records);

    // Order and values come straight from the source, unsorted.
    assert_eq!(definitions.len(), 2);
    assert_eq!(definitions[0].title, "Outro");
    assert_eq!(definitions[0].start_time, 90.0);
    assert_eq!(definitions[1].title, "Intro");
}

#[test]
fn hints_attach_to_chapters_by_start_time() {
    let records = vec![
        record("Intro", 0.0, Some("https://cdn/0.jpg")),
        record("Middle", 50.0, None),
        record("Outro", 90.0, Some("https://cdn/2.jpg")),
    ];
    let mut chapters: Vec<Chapter> = from_records(&records)
        .iter()
        .map(Chapter::from_definition)
        .collect();

    attach_hints(&mut chapters, &records);

    assert_eq!(chapters[0].fallback_thumbnail.as_deref(), Some("https://cdn/0.jpg"));
    assert!(chapters[1].fallback_thumbnail.is_none());
    assert_eq!(chapters[2].fallback_thumbnail.as_deref(), Some("https://cdn/2.jpg"));
}

#[test]
fn load_failure_swaps_in_the_fallback_reference_first() {
    let mut chapter = Chapter {
        title: "Intro".to_string(),
        start_time: 0.0,
        thumbnail: Some(Thumbnail::Captured(vec![1, 2, 3])),
        fallback_thumbnail: Some("https://cdn/fallback.jpg".to_string()),
    };
    let service = FixedService(Some("https://service/rep.jpg".to_string()));

    resolve_thumbnail_failure(&mut chapter, Some(&service), "media-1");

    assert_eq!(
        chapter.thumbnail,
        Some(Thumbnail::Remote("https://cdn/fallback.jpg".to_string()))
    );
    // Consumed so the next failure walks further down the ladder.
    assert!(chapter.fallback_thumbnail.is_none());

    resolve_thumbnail_failure(&mut chapter, Some(&service), "media-1");
    assert_eq!(
        chapter.thumbnail,
        Some(Thumbnail::Remote("https://service/rep.jpg".to_string()))
    );

    let empty = FixedService(None);
    resolve_thumbnail_failure(&mut chapter, Some(&empty), "media-1");
    assert!(chapter.thumbnail.is_none());
}

#[test]
fn load_failure_without_any_fallback_clears_the_thumbnail() {
    let mut chapter = Chapter {
        title: "Intro".to_string(),
        start_time: 0.0,
        thumbnail: Some(Thumbnail::Captured(vec![1, 2, 3])),
        fallback_thumbnail: None,
    };

    resolve_thumbnail_failure(&mut chapter, None, "media-1");

    assert!(chapter.thumbnail.is_none());
}
