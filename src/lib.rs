//! # edgequake-transcript
//!
//! Extract a student's name and per-subject marks from a photographed or
//! scanned academic transcript.
//!
//! ## Why this crate?
//!
//! Transcripts are tables, but OCR does not see tables: it sees a loose stream
//! of words, each with a line number, a horizontal position and a confidence.
//! Marks are sometimes printed as digits, sometimes spelled out
//! ("SEVEN FIVE"), sometimes pushed onto the next line, and OCR regularly
//! glues stray digits onto them. This crate turns that word stream into a
//! clean `{name, subjects, error}` record using a small set of deterministic,
//! configurable rules.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image
//!  │
//!  ├─ 1. Input      resolve local file or download from URL
//!  ├─ 2. OCR        Otsu-binarise, run tesseract (TSV words), or a pluggable engine
//!  ├─ 3. Ingest     drop empty / low-confidence words
//!  ├─ 4. Lines      group by line, sort left to right
//!  ├─ 5. Records    subject labels, spelled or numeric marks, name after anchor
//!  └─ 6. Normalise  title case, strip boilerplate, truncate, range-check
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_transcript::{extract, ExtractionConfig};
//!
//! let result = extract("transcript.jpg", &ExtractionConfig::default());
//! println!("{}", serde_json::to_string_pretty(&result).unwrap());
//! ```
//!
//! Running the pipeline over words you recognised yourself needs no OCR at all:
//!
//! ```rust
//! use edgequake_transcript::{Extractor, ExtractionRules, Word};
//!
//! let extractor = Extractor::new(ExtractionRules::default()).unwrap();
//! let result = extractor.extract(vec![
//!     Word::new("MATHEMATICS", 91.0, 4, 10.0),
//!     Word::new("SEVEN", 88.0, 4, 300.0),
//!     Word::new("FIVE", 87.0, 4, 360.0),
//! ]);
//! assert_eq!(result.subjects[0].subject, "Mathematics");
//! assert_eq!(result.subjects[0].marks, 75);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `transcript2json` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-transcript = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod extractor;
pub mod ocr;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;
pub mod vocabulary;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ExtractionConfig, ExtractionConfigBuilder, ExtractionRules, LineNumbering, MarkRules,
    NameRules, OcrOptions, ProgressCallback,
};
pub use error::{DroppedCandidate, TranscriptError};
pub use extract::{
    extract, extract_batch, extract_from_bytes, extract_input, extract_report, extract_to_file,
    extract_words,
};
pub use extractor::Extractor;
pub use ocr::{FixedWordsEngine, OcrEngine, TesseractEngine, WordStreamEngine};
pub use output::{
    ExtractionReport, ExtractionResult, ExtractionStats, ImageOutcome, SubjectMark, Word,
};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback};
pub use stream::{extract_stream, OutcomeStream};
pub use vocabulary::{DigitWords, SubjectVocabulary};
