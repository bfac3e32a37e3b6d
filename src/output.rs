//! Output types: what the OCR engine hands in and what extraction hands out.
//!
//! [`Word`] is the only thing the pipeline consumes; [`ExtractionResult`] is
//! the only thing the presentation layer is meant to see. Everything else
//! ([`ExtractionReport`], [`ExtractionStats`], [`ImageOutcome`]) is optional
//! extra context for diagnostics and batch runs.

use crate::error::DroppedCandidate;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// One OCR-recognised token.
///
/// `line_index` and `horizontal_position` are opaque ordering keys supplied by
/// the engine: they define line membership and left-to-right order, nothing
/// more.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub confidence: f32,
    pub line_index: u32,
    pub horizontal_position: f32,
}

impl Word {
    pub fn new(
        text: impl Into<String>,
        confidence: f32,
        line_index: u32,
        horizontal_position: f32,
    ) -> Self {
        Self {
            text: text.into(),
            confidence,
            line_index,
            horizontal_position,
        }
    }
}

/// A recognised subject and its mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectMark {
    pub subject: String,
    pub marks: u32,
}

/// The structured record extracted from one transcript image.
///
/// Serialises as `{"name": ..., "subjects": [...], "error": null}` on success
/// and as `{"error": "..."}` alone on failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subjects: Vec<SubjectMark>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExtractionResult {
    /// A result carrying only an error message.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            name: None,
            subjects: Vec::new(),
            error: Some(reason.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(ref error) = self.error {
            let mut map = serializer.serialize_map(Some(1))?;
            map.serialize_entry("error", error)?;
            return map.end();
        }
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("subjects", &self.subjects)?;
        map.serialize_entry("error", &self.error)?;
        map.end()
    }
}

/// Counters for one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Words the engine reported, before filtering.
    pub words_total: usize,
    /// Words left after dropping blank and zero-confidence tokens.
    pub words_kept: usize,
    /// Distinct reconstructed lines.
    pub lines: usize,
    /// Lines on which at least one subject keyword matched.
    pub subject_lines: usize,
    /// Wall-clock time including OCR.
    pub duration_ms: u64,
}

/// The result plus everything the pipeline left out along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub result: ExtractionResult,
    #[serde(default)]
    pub dropped: Vec<DroppedCandidate>,
    #[serde(default)]
    pub stats: ExtractionStats,
}

/// One image's result in a batch or stream run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageOutcome {
    /// The path or URL as given by the caller.
    pub input: String,
    /// Position of `input` in the caller's list.
    #[serde(skip)]
    pub index: usize,
    pub result: ExtractionResult,
}
