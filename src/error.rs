//! Error types for the edgequake-transcript library.
//!
//! Two distinct types reflect two distinct outcomes:
//!
//! * [`TranscriptError`] — **Fatal**: the image cannot be processed at all
//!   (undecodable file, OCR engine missing, bad configuration). Surfaced as
//!   `Err(TranscriptError)` from [`crate::extract::extract_report`] and folded
//!   into [`crate::output::ExtractionResult::error`] by [`crate::extract::extract`].
//!
//! * [`DroppedCandidate`] — **Non-fatal**: one transcript line looked like a
//!   subject but was left out of the result (no mark, duplicate subject,
//!   implausible mark). These never reach the success-path result; they are
//!   collected in [`crate::output::ExtractionReport::dropped`] for callers who
//!   want to see what the heuristics threw away.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-transcript library.
#[derive(Debug, Error)]
pub enum TranscriptError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The image does not exist or could not be decoded.
    ///
    /// The display string is part of the output contract: it is what callers
    /// see in `ExtractionResult::error`.
    #[error("Could not read image file")]
    ImageUnreadable { path: PathBuf, detail: String },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// A recorded word stream could not be parsed.
    #[error("Invalid word stream '{path}': {detail}")]
    InvalidWordStream { path: PathBuf, detail: String },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR engine binary could not be started.
    #[error("OCR engine '{command}' is not available.\n{hint}")]
    OcrUnavailable { command: String, hint: String },

    /// The OCR engine ran but failed or produced unparseable output.
    #[error("OCR failed: {detail}")]
    OcrFailed { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or rules validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TranscriptError {
    /// Shorthand for an [`TranscriptError::ImageUnreadable`].
    pub(crate) fn unreadable(path: impl Into<PathBuf>, detail: impl ToString) -> Self {
        TranscriptError::ImageUnreadable {
            path: path.into(),
            detail: detail.to_string(),
        }
    }
}

/// A subject candidate that was recognised on a line but left out of the result.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DroppedCandidate {
    /// A subject keyword matched but neither mark strategy found a value.
    #[error("Line {line}: '{subject}' has no recognisable mark")]
    NoMark { line: u32, subject: String },

    /// An earlier line already produced this subject.
    #[error("Line {line}: '{subject}' ({marks}) duplicates an earlier line")]
    DuplicateSubject {
        line: u32,
        subject: String,
        marks: u32,
    },

    /// The mark was outside the plausible range even after truncation.
    #[error("'{subject}': mark {raw} (normalised {normalised}) is out of range")]
    ImplausibleMark {
        subject: String,
        raw: u32,
        normalised: u32,
    },
}
