//! Integration tests for edgequake-transcript.
//!
//! Most tests drive the public API with recorded word streams, so they need
//! neither Tesseract nor sample scans. The one test that shells out to a real
//! Tesseract binary is gated behind `E2E_ENABLED`.
//!
//! Run with:
//!   cargo test --test extraction -- --nocapture
//!
//! Including the Tesseract run:
//!   E2E_ENABLED=1 cargo test --test extraction -- --nocapture

use edgequake_transcript::{
    extract, extract_batch, extract_from_bytes, extract_report, extract_words, DroppedCandidate,
    ExtractionConfig, ExtractionProgressCallback, ExtractionResult, FixedWordsEngine, SubjectMark,
    SubjectVocabulary, TranscriptError, Word, WordStreamEngine,
};
use image::{GrayImage, Luma};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Lay out `lines` as OCR words: one word per entry, 100px apart.
fn words(lines: &[(u32, &[&str])]) -> Vec<Word> {
    lines
        .iter()
        .flat_map(|(line, texts)| {
            texts
                .iter()
                .enumerate()
                .map(move |(i, t)| Word::new(*t, 91.5, *line, (i * 100) as f32))
        })
        .collect()
}

fn run(lines: &[(u32, &[&str])]) -> ExtractionResult {
    extract_words(words(lines), &ExtractionConfig::default())
        .expect("default rules are valid")
        .result
}

fn sm(subject: &str, marks: u32) -> SubjectMark {
    SubjectMark {
        subject: subject.to_string(),
        marks,
    }
}

/// Save `words` as a recorded word stream and return its path.
fn record(dir: &Path, name: &str, words: &[Word]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string(words).unwrap()).unwrap();
    path
}

fn word_stream_config() -> ExtractionConfig {
    ExtractionConfig::builder()
        .engine(Arc::new(WordStreamEngine))
        .build()
        .unwrap()
}

/// A typical transcript as OCR reports it.
fn sample_transcript() -> Vec<Word> {
    words(&[
        (1, &["BHUTAN", "HIGHER", "SECONDARY", "EDUCATION", "CERTIFICATE"]),
        (2, &["Name:", "INDEX", "NO", "pema", "WANGMO"]),
        (4, &["ENGLISH", "SEVEN", "FIVE"]),
        (6, &["DZONGKHA", "68"]),
        (8, &["COMPUTER", "APPLICATIONS", "90"]),
        (10, &["PHYSICS"]),
        (11, &["85"]),
        (13, &["CHEMISTRY", "NINE", "FIVE", "SIX"]),
        (15, &["MATHEMATICS", "ONE", "ZERO", "ONE", "ONE"]),
        (17, &["English", "40"]),
        (19, &["Total", "458"]),
    ])
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[test]
fn test_sample_transcript_end_to_end() {
    let result = extract_words(sample_transcript(), &ExtractionConfig::default())
        .unwrap()
        .result;
    assert_eq!(result.name.as_deref(), Some("Pema Wangmo"));
    assert_eq!(
        result.subjects,
        vec![
            sm("English", 75),
            sm("Dzongkha", 68),
            sm("Applications Computer", 90),
            sm("Physics", 85),
            sm("Chemistry", 95),
        ]
    );
    assert!(result.error.is_none());
}

#[test]
fn test_report_explains_every_omission() {
    let report = extract_words(sample_transcript(), &ExtractionConfig::default()).unwrap();
    assert!(report.dropped.contains(&DroppedCandidate::DuplicateSubject {
        line: 17,
        subject: "English".into(),
        marks: 40,
    }));
    assert!(report.dropped.contains(&DroppedCandidate::ImplausibleMark {
        subject: "Mathematics".into(),
        raw: 101,
        normalised: 10,
    }));
    assert_eq!(report.stats.words_total, report.stats.words_kept);
    assert_eq!(report.stats.lines, 11);
}

#[test]
fn test_spelled_digits_beat_numeric_token() {
    let r = run(&[(3, &["MATHS", "SEVEN", "FIVE", "12"])]);
    assert_eq!(r.subjects, vec![sm("Maths", 75)]);
}

#[test]
fn test_overflowing_mark_is_truncated() {
    let r = run(&[(3, &["CHEMISTRY", "NINE", "FIVE", "SIX"])]);
    assert_eq!(r.subjects, vec![sm("Chemistry", 95)]);
}

#[test]
fn test_truncation_below_range_drops_subject() {
    let r = run(&[(3, &["CHEMISTRY", "ONE", "ZERO", "ONE", "ONE"])]);
    assert!(r.subjects.is_empty(), "101 → 10 is implausible: {r:?}");

    let config = ExtractionConfig::builder().max_digit_words(4).build().unwrap();
    let report = extract_words(
        words(&[(3, &["CHEMISTRY", "ONE", "ZERO", "ONE", "ONE"])]),
        &config,
    )
    .unwrap();
    assert!(report.result.subjects.is_empty());
    assert_eq!(
        report.dropped,
        vec![DroppedCandidate::ImplausibleMark {
            subject: "Chemistry".into(),
            raw: 1011,
            normalised: 10,
        }]
    );
}

#[test]
fn test_out_of_range_numeric_tokens_are_skipped() {
    let r = run(&[(3, &["CHEMISTRY", "956", "2023", "88"])]);
    assert_eq!(r.subjects, vec![sm("Chemistry", 88)]);
}

#[test]
fn test_mark_on_following_line() {
    let r = run(&[(7, &["PHYSICS"]), (8, &["85"])]);
    assert_eq!(r.subjects, vec![sm("Physics", 85)]);
}

#[test]
fn test_gap_line_is_not_merged() {
    // Line 8 is missing, so line 9 is not the line after PHYSICS.
    let report = extract_words(
        words(&[(7, &["PHYSICS"]), (9, &["85"])]),
        &ExtractionConfig::default(),
    )
    .unwrap();
    assert!(report.result.subjects.is_empty(), "{:?}", report.result);
    assert_eq!(
        report.dropped,
        vec![DroppedCandidate::NoMark {
            line: 7,
            subject: "Physics".into(),
        }]
    );
}

#[test]
fn test_composite_subject_label() {
    let r = run(&[(2, &["COMPUTER", "APPLICATIONS", "90"])]);
    assert_eq!(r.subjects, vec![sm("Applications Computer", 90)]);
}

#[test]
fn test_glued_subject_label() {
    let r = run(&[(2, &["COMPUTERAPPLICATIONS", "90"])]);
    assert_eq!(r.subjects, vec![sm("Applications Computer", 90)]);
}

#[test]
fn test_boilerplate_stripped_from_name() {
    let r = run(&[(1, &["Name:", "INDEX", "NO", "John", "Doe"])]);
    assert_eq!(r.name.as_deref(), Some("John Doe"));
}

#[test]
fn test_name_without_anchor_is_null() {
    let r = run(&[(1, &["Student", "John", "Doe"])]);
    assert_eq!(r.name, None);
    let json = serde_json::to_value(&r).unwrap();
    assert!(json["name"].is_null());
}

#[test]
fn test_only_boilerplate_after_anchor_is_null() {
    let r = run(&[(1, &["NAME", "INDEX", "NO", "1234"])]);
    assert_eq!(r.name, None);
}

#[test]
fn test_zero_confidence_words_ignored() {
    let mut w = words(&[(2, &["HISTORY", "88", "61"])]);
    w[1].confidence = 0.0;
    let r = extract_words(w, &ExtractionConfig::default()).unwrap().result;
    assert_eq!(r.subjects, vec![sm("History", 61)]);
}

#[test]
fn test_words_out_of_order_on_a_line() {
    let w = vec![
        Word::new("FOUR", 90.0, 5, 400.0),
        Word::new("GEOGRAPHY", 90.0, 5, 0.0),
        Word::new("SIX", 90.0, 5, 300.0),
    ];
    let r = extract_words(w, &ExtractionConfig::default()).unwrap().result;
    assert_eq!(r.subjects, vec![sm("Geography", 64)]);
}

// ── Invariants ───────────────────────────────────────────────────────────────

#[test]
fn test_same_input_same_output() {
    let config = ExtractionConfig::default();
    let a = extract_words(sample_transcript(), &config).unwrap();
    let b = extract_words(sample_transcript(), &config).unwrap();
    assert_eq!(a.result, b.result);
    assert_eq!(a.dropped, b.dropped);
    assert_eq!(
        serde_json::to_string(&a.result).unwrap(),
        serde_json::to_string(&b.result).unwrap()
    );
}

#[test]
fn test_every_mark_in_range_and_subjects_unique() {
    let noisy: &[(u32, &[&str])] = &[
        (1, &["ENGLISH", "29"]),
        (3, &["ENGLISH", "ONE", "ZERO", "ONE"]),
        (5, &["SCIENCE", "9999"]),
        (7, &["HISTORY", "100"]),
        (9, &["CIVICS", "30"]),
        (11, &["GEOGRAPHY", "ZERO", "ZERO"]),
        (13, &["Science", "55"]),
        (15, &["MATHS", "NINE", "NINE", "NINE", "NINE"]),
    ];
    let r = run(noisy);
    for s in &r.subjects {
        assert!(
            (30..=100).contains(&s.marks),
            "{} has out-of-range mark {}",
            s.subject,
            s.marks
        );
    }
    let mut labels: Vec<&str> = r.subjects.iter().map(|s| s.subject.as_str()).collect();
    let total = labels.len();
    labels.sort();
    labels.dedup();
    assert_eq!(labels.len(), total, "duplicate subjects in {r:?}");

    // Line 5 has no plausible mark, so the later Science line supplies it.
    assert_eq!(
        r.subjects,
        vec![
            sm("History", 100),
            sm("Civics", 30),
            sm("Science", 55),
            sm("Maths", 99),
        ]
    );
}

#[test]
fn test_custom_vocabulary() {
    let config = ExtractionConfig::builder()
        .vocabulary(SubjectVocabulary::new(["biology", "ECONOMICS"]))
        .build()
        .unwrap();
    let r = extract_words(
        words(&[(1, &["BIOLOGY", "72"]), (3, &["PHYSICS", "80"])]),
        &config,
    )
    .unwrap()
    .result;
    assert_eq!(r.subjects, vec![sm("Biology", 72)]);
}

#[test]
fn test_custom_mark_range() {
    let config = ExtractionConfig::builder().mark_range(0, 50).build().unwrap();
    let r = extract_words(words(&[(1, &["SCIENCE", "48"])]), &config)
        .unwrap()
        .result;
    assert_eq!(r.subjects, vec![sm("Science", 48)]);
}

// ── Images and engines ───────────────────────────────────────────────────────

#[test]
fn test_unreadable_image_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.png");
    std::fs::write(&path, b"this is not a png").unwrap();

    let result = extract(&path, &ExtractionConfig::default());
    assert_eq!(
        serde_json::to_string(&result).unwrap(),
        r#"{"error":"Could not read image file"}"#
    );
}

#[test]
fn test_missing_image_json() {
    let result = extract("/nonexistent/transcript.jpg", &ExtractionConfig::default());
    assert_eq!(result.error.as_deref(), Some("Could not read image file"));
    assert!(result.subjects.is_empty());
}

#[test]
fn test_garbage_bytes() {
    let result = extract_from_bytes(&[0xFF, 0x00, 0x13, 0x37], &ExtractionConfig::default());
    assert!(result.is_error());
}

#[test]
fn test_png_bytes_reach_ocr() {
    let mut png = Vec::new();
    image::DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 32, Luma([255])))
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    let config = ExtractionConfig::builder()
        .tesseract_cmd("/nonexistent/bin/tesseract")
        .build()
        .unwrap();

    let result = extract_from_bytes(&png, &config);
    assert_ne!(result.error.as_deref(), Some("Could not read image file"));
    assert!(result.is_error());
}

#[test]
fn test_word_stream_engine_replays_recording() {
    let dir = tempfile::tempdir().unwrap();
    let path = record(dir.path(), "scan.words.json", &sample_transcript());
    let result = extract(&path, &word_stream_config());
    assert_eq!(result.name.as_deref(), Some("Pema Wangmo"));
    assert_eq!(result.subjects.len(), 5);
}

#[test]
fn test_word_stream_engine_rejects_bad_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "[{\"text\": ").unwrap();
    let err = extract_report(&path, &word_stream_config()).unwrap_err();
    assert!(matches!(err, TranscriptError::InvalidWordStream { .. }));
}

#[test]
fn test_missing_tesseract_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blank.png");
    GrayImage::from_pixel(64, 32, Luma([255])).save(&path).unwrap();

    let config = ExtractionConfig::builder()
        .tesseract_cmd("/nonexistent/bin/tesseract")
        .build()
        .unwrap();
    let err = extract_report(&path, &config).unwrap_err();
    assert!(
        matches!(err, TranscriptError::OcrUnavailable { .. }),
        "unexpected error: {err}"
    );
}

#[test]
fn test_real_tesseract_on_blank_page() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blank.png");
    GrayImage::from_pixel(400, 200, Luma([250])).save(&path).unwrap();

    let report = extract_report(&path, &ExtractionConfig::default()).unwrap();
    assert!(report.result.error.is_none());
    assert!(report.result.subjects.is_empty());
    assert_eq!(report.result.name, None);
    println!("tesseract took {}ms", report.stats.duration_ms);
}

// ── Batch ────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct BatchCounter {
    started: AtomicUsize,
    finished: AtomicUsize,
    successes: AtomicUsize,
}

impl ExtractionProgressCallback for BatchCounter {
    fn on_batch_start(&self, total: usize) {
        self.started.store(total, Ordering::SeqCst);
    }
    fn on_batch_complete(&self, _total: usize, success_count: usize) {
        self.finished.fetch_add(1, Ordering::SeqCst);
        self.successes.store(success_count, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_batch_keeps_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let a = record(dir.path(), "a.json", &words(&[(1, &["HISTORY", "70"])]));
    let b = record(dir.path(), "b.json", &words(&[(1, &["CIVICS", "SIX", "TWO"])]));
    let counter = Arc::new(BatchCounter::default());

    let config = ExtractionConfig::builder()
        .engine(Arc::new(WordStreamEngine))
        .concurrency(3)
        .progress_callback(counter.clone())
        .build()
        .unwrap();
    let inputs = vec![
        a.to_string_lossy().to_string(),
        "/nonexistent/c.json".to_string(),
        b.to_string_lossy().to_string(),
    ];

    let outcomes = extract_batch(&inputs, &config).await.unwrap();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].result.subjects, vec![sm("History", 70)]);
    assert!(outcomes[1].result.is_error());
    assert_eq!(outcomes[2].result.subjects, vec![sm("Civics", 62)]);
    for (i, o) in outcomes.iter().enumerate() {
        assert_eq!(o.index, i);
        assert_eq!(o.input, inputs[i]);
    }

    assert_eq!(counter.started.load(Ordering::SeqCst), 3);
    assert_eq!(counter.finished.load(Ordering::SeqCst), 1);
    assert_eq!(counter.successes.load(Ordering::SeqCst), 2);

    let json = serde_json::to_value(&outcomes).unwrap();
    assert_eq!(json[1]["result"]["error"], "Could not read image file");
    assert!(json[0].get("index").is_none());
}

#[tokio::test]
async fn test_concurrent_calls_share_nothing() {
    let config = ExtractionConfig::builder()
        .engine(Arc::new(FixedWordsEngine::new(sample_transcript())))
        .build()
        .unwrap();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let config = config.clone();
            tokio::task::spawn_blocking(move || extract("ignored.png", &config))
        })
        .collect();

    let first = extract("ignored.png", &config);
    for h in handles {
        assert_eq!(h.await.unwrap(), first);
    }
}
