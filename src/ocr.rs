//! OCR collaborators: turn an image file into a stream of [`Word`]s.
//!
//! The extraction pipeline only ever sees `Vec<Word>`. Where those words come
//! from is behind the [`OcrEngine`] trait:
//!
//! * [`TesseractEngine`] — the default. Binarises the image, runs the
//!   `tesseract` CLI in TSV mode, and parses one `Word` per recognised token.
//! * [`WordStreamEngine`] — replays a word stream recorded earlier as JSON
//!   (CLI `--dump-words`), so extraction rules can be iterated on without
//!   re-running OCR.
//! * [`FixedWordsEngine`] — returns the same words for any path; handy in
//!   tests and when words come from an engine living outside this crate.

use crate::config::{ExtractionConfig, LineNumbering, OcrOptions};
use crate::error::TranscriptError;
use crate::output::Word;
use crate::pipeline::binarize;
use image::ImageFormat;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use tracing::debug;

/// Anything that can read words off an image.
///
/// Implementations must be `Send + Sync`: batch mode calls `recognize` from
/// several blocking threads at once. `recognize` must not keep the path
/// around after it returns.
pub trait OcrEngine: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Recognise every word in the image at `image`.
    ///
    /// An image that cannot be decoded must be reported as
    /// [`TranscriptError::ImageUnreadable`].
    fn recognize(&self, image: &Path) -> Result<Vec<Word>, TranscriptError>;
}

/// The configured engine, or Tesseract built from `config.ocr`.
pub fn resolve_engine(config: &ExtractionConfig) -> Arc<dyn OcrEngine> {
    match config.engine {
        Some(ref engine) => Arc::clone(engine),
        None => Arc::new(TesseractEngine::new(config.ocr.clone())),
    }
}

// ── Tesseract ────────────────────────────────────────────────────────────

/// OCR engine wrapping the `tesseract` CLI tool.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    options: OcrOptions,
}

impl TesseractEngine {
    pub fn new(options: OcrOptions) -> Self {
        Self { options }
    }

    fn command(&self, image: &Path) -> Command {
        let mut cmd = Command::new(&self.options.tesseract_cmd);
        cmd.arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.options.language);
        if let Some(psm) = self.options.page_segmentation_mode {
            cmd.arg("--psm").arg(psm.to_string());
        }
        cmd.arg("tsv");
        cmd
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new(OcrOptions::default())
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &Path) -> Result<Vec<Word>, TranscriptError> {
        let binary = binarize::load_binarized(image)?;

        // Tesseract reads from disk; the temp file is removed on drop.
        let tmp = tempfile::Builder::new()
            .prefix("transcript-ocr")
            .suffix(".png")
            .tempfile()
            .map_err(|e| TranscriptError::Internal(format!("tempfile: {e}")))?;
        binary
            .save_with_format(tmp.path(), ImageFormat::Png)
            .map_err(|e| TranscriptError::Internal(format!("cannot write binarised image: {e}")))?;

        let mut cmd = self.command(tmp.path());
        debug!("Running {:?}", cmd);
        let output = cmd.output().map_err(|e| {
            let command = self.options.tesseract_cmd.display().to_string();
            if e.kind() == ErrorKind::NotFound {
                TranscriptError::OcrUnavailable {
                    command,
                    hint: "Install Tesseract (e.g. `apt install tesseract-ocr`) or pass --tesseract-cmd."
                        .to_string(),
                }
            } else {
                TranscriptError::OcrFailed {
                    detail: format!("cannot run {command}: {e}"),
                }
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscriptError::OcrFailed {
                detail: format!("tesseract exited with {}: {}", output.status, stderr.trim()),
            });
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let words = parse_tsv(&tsv, self.options.line_numbering)?;
        debug!("tesseract recognised {} words", words.len());
        Ok(words)
    }
}

/// TSV row level for individual words.
const WORD_LEVEL: u32 = 5;

/// Parse `tesseract ... tsv` output into words.
///
/// Columns: `level page_num block_num par_num line_num word_num left top
/// width height conf text`. Only word-level rows are returned; page, block,
/// paragraph and line rows carry no text. Confidence and text are passed
/// through untouched; filtering is the pipeline's job.
pub fn parse_tsv(tsv: &str, numbering: LineNumbering) -> Result<Vec<Word>, TranscriptError> {
    let mut words = Vec::new();
    let mut global_lines: HashMap<(u32, u32, u32, u32), u32> = HashMap::new();

    for (row_no, row) in tsv.lines().enumerate() {
        if row.trim().is_empty() || row.starts_with("level") {
            continue;
        }
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 11 {
            return Err(malformed(row_no, "expected at least 11 columns"));
        }

        let int = |i: usize, field: &str| -> Result<u32, TranscriptError> {
            cols[i]
                .trim()
                .parse::<u32>()
                .map_err(|_| malformed(row_no, &format!("bad {field} '{}'", cols[i])))
        };
        let float = |i: usize, field: &str| -> Result<f32, TranscriptError> {
            cols[i]
                .trim()
                .parse::<f32>()
                .map_err(|_| malformed(row_no, &format!("bad {field} '{}'", cols[i])))
        };

        if int(0, "level")? != WORD_LEVEL {
            continue;
        }
        let key = (
            int(1, "page_num")?,
            int(2, "block_num")?,
            int(3, "par_num")?,
            int(4, "line_num")?,
        );
        let line_index = match numbering {
            LineNumbering::Raw => key.3,
            LineNumbering::Global => {
                let next = global_lines.len() as u32 + 1;
                *global_lines.entry(key).or_insert(next)
            }
        };

        words.push(Word {
            text: cols.get(11).copied().unwrap_or("").to_string(),
            confidence: float(10, "conf")?,
            line_index,
            horizontal_position: float(6, "left")?,
        });
    }
    Ok(words)
}

fn malformed(row_no: usize, detail: &str) -> TranscriptError {
    TranscriptError::OcrFailed {
        detail: format!("malformed TSV at row {}: {}", row_no + 1, detail),
    }
}

// ── Recorded word streams ────────────────────────────────────────────────

/// Replays word streams stored as JSON arrays of [`Word`].
#[derive(Debug, Clone, Default)]
pub struct WordStreamEngine;

impl OcrEngine for WordStreamEngine {
    fn name(&self) -> &str {
        "word-stream"
    }

    fn recognize(&self, image: &Path) -> Result<Vec<Word>, TranscriptError> {
        let text = std::fs::read_to_string(image).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                TranscriptError::unreadable(image, e)
            } else {
                TranscriptError::InvalidWordStream {
                    path: image.to_path_buf(),
                    detail: e.to_string(),
                }
            }
        })?;
        serde_json::from_str(&text).map_err(|e| TranscriptError::InvalidWordStream {
            path: image.to_path_buf(),
            detail: e.to_string(),
        })
    }
}

/// Returns the same words whatever image it is given.
#[derive(Debug, Clone, Default)]
pub struct FixedWordsEngine {
    words: Vec<Word>,
}

impl FixedWordsEngine {
    pub fn new(words: Vec<Word>) -> Self {
        Self { words }
    }
}

impl OcrEngine for FixedWordsEngine {
    fn name(&self) -> &str {
        "fixed"
    }

    fn recognize(&self, _image: &Path) -> Result<Vec<Word>, TranscriptError> {
        Ok(self.words.clone())
    }
}
