//! Configuration types for transcript extraction.
//!
//! Two layers:
//!
//! * [`ExtractionRules`] — the heuristics themselves (keyword tables, mark
//!   range, window sizes). Plain serde data, so a rules file can retarget the
//!   pipeline at another transcript layout or language.
//! * [`ExtractionConfig`] — rules plus the environment they run in (OCR
//!   engine, batch concurrency, progress reporting), built via
//!   [`ExtractionConfigBuilder`].
//!
//! Both are immutable once built and nothing here is process-global, so two
//! extractions with different configs can run side by side.

use crate::error::TranscriptError;
use crate::ocr::OcrEngine;
use crate::progress::ExtractionProgressCallback;
use crate::vocabulary::{
    DigitWords, SubjectVocabulary, DEFAULT_NAME_ANCHOR, DEFAULT_NAME_BOILERPLATE,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared handle to a batch progress callback.
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

// ── Rules ────────────────────────────────────────────────────────────────

/// How the student name is located and cleaned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameRules {
    /// Case-insensitive substring marking the word just before the name. Default: "Name".
    pub anchor: String,
    /// How many words after the anchor are considered. Default: 4.
    pub window: usize,
    /// Tokens removed from the candidate name, compared case-insensitively.
    /// Default: INDEX, NO, CERTIFICATE.
    pub boilerplate: Vec<String>,
}

impl Default for NameRules {
    fn default() -> Self {
        Self {
            anchor: DEFAULT_NAME_ANCHOR.to_string(),
            window: 4,
            boilerplate: DEFAULT_NAME_BOILERPLATE
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// How marks are recognised and judged plausible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkRules {
    /// Lowest plausible mark, inclusive. Default: 30.
    pub min: u32,
    /// Highest plausible mark, inclusive. Marks above it are truncated first. Default: 100.
    pub max: u32,
    /// Digit words needed before spelled-digit reconstruction kicks in. Default: 2.
    pub min_digit_words: usize,
    /// Digit words concatenated at most. Default: 3.
    pub max_digit_words: usize,
    /// Leading digits kept when a mark exceeds `max` (956 → 95). Default: 2.
    pub overflow_keep_digits: usize,
}

impl Default for MarkRules {
    fn default() -> Self {
        Self {
            min: 30,
            max: 100,
            min_digit_words: 2,
            max_digit_words: 3,
            overflow_keep_digits: 2,
        }
    }
}

impl MarkRules {
    pub fn is_plausible(&self, mark: u32) -> bool {
        (self.min..=self.max).contains(&mark)
    }
}

/// Every heuristic the pipeline applies, as plain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRules {
    pub vocabulary: SubjectVocabulary,
    pub digit_words: DigitWords,
    pub name: NameRules,
    pub marks: MarkRules,
    /// Append the next line's words when looking for a subject's mark. Default: true.
    pub merge_next_line: bool,
    /// Words at or below this confidence are discarded. Default: 0.0.
    pub min_confidence: f32,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            vocabulary: SubjectVocabulary::default(),
            digit_words: DigitWords::default(),
            name: NameRules::default(),
            marks: MarkRules::default(),
            merge_next_line: true,
            min_confidence: 0.0,
        }
    }
}

impl ExtractionRules {
    /// Check the rules are internally consistent.
    pub fn validate(&self) -> Result<(), TranscriptError> {
        if self.vocabulary.is_empty() {
            return Err(TranscriptError::InvalidConfig(
                "Subject vocabulary must not be empty".into(),
            ));
        }
        if self.vocabulary.keywords().iter().any(|k| k.is_empty()) {
            return Err(TranscriptError::InvalidConfig(
                "Subject keywords must not be blank".into(),
            ));
        }
        if let Some((word, digit)) = self.digit_words.iter().find(|(_, d)| *d > 9) {
            return Err(TranscriptError::InvalidConfig(format!(
                "Digit word '{word}' maps to {digit}, expected 0–9"
            )));
        }
        if self.name.anchor.trim().is_empty() {
            return Err(TranscriptError::InvalidConfig(
                "Name anchor must not be blank".into(),
            ));
        }
        let m = &self.marks;
        if m.min > m.max {
            return Err(TranscriptError::InvalidConfig(format!(
                "Mark range is empty: min {} > max {}",
                m.min, m.max
            )));
        }
        if m.min_digit_words == 0 || m.min_digit_words > m.max_digit_words {
            return Err(TranscriptError::InvalidConfig(format!(
                "Digit-word bounds must satisfy 1 ≤ min ≤ max, got {}..{}",
                m.min_digit_words, m.max_digit_words
            )));
        }
        if m.overflow_keep_digits == 0 {
            return Err(TranscriptError::InvalidConfig(
                "overflow_keep_digits must be ≥ 1".into(),
            ));
        }
        if !self.min_confidence.is_finite() {
            return Err(TranscriptError::InvalidConfig(
                "min_confidence must be a finite number".into(),
            ));
        }
        Ok(())
    }

    /// Load rules from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl Into<PathBuf>) -> Result<Self, TranscriptError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path).map_err(|e| {
            TranscriptError::InvalidConfig(format!("Cannot read rules '{}': {e}", path.display()))
        })?;
        let rules: ExtractionRules = serde_json::from_str(&text).map_err(|e| {
            TranscriptError::InvalidConfig(format!("Cannot parse rules '{}': {e}", path.display()))
        })?;
        rules.validate()?;
        Ok(rules)
    }
}

// ── OCR options ──────────────────────────────────────────────────────────

/// Which Tesseract field becomes [`crate::output::Word::line_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineNumbering {
    /// Tesseract's own `line_num`, which restarts in every block. (default)
    ///
    /// Lines with the same number in different blocks fall into one bucket;
    /// on two-column transcripts this is what pairs a subject with its mark.
    #[default]
    Raw,
    /// One sequential number per distinct (page, block, paragraph, line).
    Global,
}

/// Settings for the built-in Tesseract engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrOptions {
    /// Tesseract executable. Default: `tesseract` on `PATH`.
    pub tesseract_cmd: PathBuf,
    /// Tesseract language pack. Default: "eng".
    pub language: String,
    /// `--psm` value; `None` leaves Tesseract's default.
    pub page_segmentation_mode: Option<u8>,
    pub line_numbering: LineNumbering,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            tesseract_cmd: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            page_segmentation_mode: None,
            line_numbering: LineNumbering::default(),
        }
    }
}

// ── Config ───────────────────────────────────────────────────────────────

/// Configuration for transcript extraction.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_transcript::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .mark_range(35, 100)
///     .concurrency(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.rules.marks.min, 35);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// The extraction heuristics.
    pub rules: ExtractionRules,

    /// Settings for the default Tesseract engine.
    pub ocr: OcrOptions,

    /// Pre-constructed OCR engine. Takes precedence over `ocr`.
    pub engine: Option<Arc<dyn OcrEngine>>,

    /// Images processed at once in batch and stream modes. Default: available cores.
    ///
    /// Each extraction is CPU-bound (decode, threshold, Tesseract), so going
    /// beyond the core count only adds contention.
    pub concurrency: usize,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional callback for batch progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            rules: ExtractionRules::default(),
            ocr: OcrOptions::default(),
            engine: None,
            concurrency: default_concurrency(),
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("rules", &self.rules)
            .field("ocr", &self.ocr)
            .field("engine", &self.engine.as_ref().map(|e| e.name().to_string()))
            .field("concurrency", &self.concurrency)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    /// Replace every rule at once (e.g. from a rules file).
    pub fn rules(mut self, rules: ExtractionRules) -> Self {
        self.config.rules = rules;
        self
    }

    pub fn vocabulary(mut self, vocabulary: SubjectVocabulary) -> Self {
        self.config.rules.vocabulary = vocabulary;
        self
    }

    pub fn digit_words(mut self, digit_words: DigitWords) -> Self {
        self.config.rules.digit_words = digit_words;
        self
    }

    pub fn name_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.config.rules.name.anchor = anchor.into();
        self
    }

    pub fn name_window(mut self, words: usize) -> Self {
        self.config.rules.name.window = words.max(1);
        self
    }

    pub fn name_boilerplate<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.rules.name.boilerplate = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn mark_range(mut self, min: u32, max: u32) -> Self {
        self.config.rules.marks.min = min;
        self.config.rules.marks.max = max;
        self
    }

    pub fn max_digit_words(mut self, n: usize) -> Self {
        self.config.rules.marks.max_digit_words = n.max(1);
        self
    }

    pub fn min_digit_words(mut self, n: usize) -> Self {
        self.config.rules.marks.min_digit_words = n.max(1);
        self
    }

    pub fn overflow_keep_digits(mut self, n: usize) -> Self {
        self.config.rules.marks.overflow_keep_digits = n.max(1);
        self
    }

    pub fn merge_next_line(mut self, v: bool) -> Self {
        self.config.rules.merge_next_line = v;
        self
    }

    pub fn min_confidence(mut self, c: f32) -> Self {
        self.config.rules.min_confidence = c;
        self
    }

    pub fn tesseract_cmd(mut self, cmd: impl Into<PathBuf>) -> Self {
        self.config.ocr.tesseract_cmd = cmd.into();
        self
    }

    pub fn language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr.language = lang.into();
        self
    }

    pub fn page_segmentation_mode(mut self, psm: u8) -> Self {
        self.config.ocr.page_segmentation_mode = Some(psm.min(13));
        self
    }

    pub fn line_numbering(mut self, numbering: LineNumbering) -> Self {
        self.config.ocr.line_numbering = numbering;
        self
    }

    pub fn engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, TranscriptError> {
        self.config.rules.validate()?;
        if self.config.concurrency == 0 {
            return Err(TranscriptError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if self.config.ocr.language.trim().is_empty() {
            return Err(TranscriptError::InvalidConfig(
                "OCR language must not be blank".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_observed_transcript_format() {
        let rules = ExtractionRules::default();
        assert_eq!(rules.marks.min, 30);
        assert_eq!(rules.marks.max, 100);
        assert_eq!(rules.marks.max_digit_words, 3);
        assert_eq!(rules.marks.overflow_keep_digits, 2);
        assert_eq!(rules.name.window, 4);
        assert_eq!(rules.name.anchor, "Name");
        assert!(rules.merge_next_line);
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn test_builder_rejects_inverted_mark_range() {
        let err = ExtractionConfig::builder()
            .mark_range(90, 40)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("min 90 > max 40"), "got: {err}");
    }

    #[test]
    fn test_builder_rejects_empty_vocabulary() {
        let empty: [&str; 0] = [];
        let result = ExtractionConfig::builder()
            .vocabulary(SubjectVocabulary::new(empty))
            .build();
        assert!(matches!(result, Err(TranscriptError::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_clamps_counts() {
        let config = ExtractionConfig::builder()
            .concurrency(0)
            .name_window(0)
            .overflow_keep_digits(0)
            .build()
            .unwrap();
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.rules.name.window, 1);
        assert_eq!(config.rules.marks.overflow_keep_digits, 1);
    }

    #[test]
    fn test_min_digit_words_above_max_is_rejected() {
        let result = ExtractionConfig::builder()
            .min_digit_words(4)
            .max_digit_words(3)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_rules_json_fills_missing_fields() {
        let rules: ExtractionRules =
            serde_json::from_str(r#"{"marks": {"min": 40}, "vocabulary": ["biology"]}"#).unwrap();
        assert_eq!(rules.marks.min, 40);
        assert_eq!(rules.marks.max, 100);
        assert_eq!(rules.vocabulary.keywords(), &["BIOLOGY".to_string()]);
        assert_eq!(rules.digit_words.len(), 10);
    }

    #[test]
    fn test_rules_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, r#"{"name": {"window": 3}}"#).unwrap();
        let rules = ExtractionRules::from_json_file(&path).unwrap();
        assert_eq!(rules.name.window, 3);
        assert_eq!(rules.name.anchor, "Name");
    }

    #[test]
    fn test_line_numbering_serde_names() {
        let v: LineNumbering = serde_json::from_str(r#""global""#).unwrap();
        assert_eq!(v, LineNumbering::Global);
    }

    #[test]
    fn test_plausible_range_is_inclusive() {
        let m = MarkRules::default();
        assert!(m.is_plausible(30));
        assert!(m.is_plausible(100));
        assert!(!m.is_plausible(29));
        assert!(!m.is_plausible(101));
    }
}
