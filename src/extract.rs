//! Extraction entry points.
//!
//! The core call is synchronous: [`extract`] takes one image path and returns
//! one [`ExtractionResult`], never an `Err`. Fatal problems (undecodable
//! image, missing OCR engine) land in `result.error`. Use
//! [`extract_report`] when you want the typed error and the diagnostics.
//!
//! The async functions ([`extract_input`], [`extract_to_file`],
//! [`extract_batch`]) wrap the same core for URL inputs and for running many
//! images at once. They move the CPU-bound work onto
//! `tokio::task::spawn_blocking` so runtime worker threads never stall on
//! OCR.

use crate::config::ExtractionConfig;
use crate::error::TranscriptError;
use crate::extractor::Extractor;
use crate::ocr::{resolve_engine, OcrEngine};
use crate::output::{ExtractionReport, ExtractionResult, ImageOutcome, Word};
use crate::pipeline::input;
use crate::stream::extract_stream;
use futures::StreamExt;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Extract the name and subject marks from one transcript image.
///
/// This is the primary entry point for the library.
///
/// # Example
/// ```rust,no_run
/// use edgequake_transcript::{extract, ExtractionConfig};
///
/// let result = extract("transcript.jpg", &ExtractionConfig::default());
/// match result.error {
///     Some(reason) => eprintln!("failed: {reason}"),
///     None => println!("{}", serde_json::to_string_pretty(&result).unwrap()),
/// }
/// ```
pub fn extract(image: impl AsRef<Path>, config: &ExtractionConfig) -> ExtractionResult {
    match extract_report(image, config) {
        Ok(report) => report.result,
        Err(e) => ExtractionResult::failed(e.to_string()),
    }
}

/// Extract from one image and keep the diagnostics.
///
/// # Errors
/// - [`TranscriptError::ImageUnreadable`] — the image is missing or cannot be decoded
/// - [`TranscriptError::OcrUnavailable`] / [`TranscriptError::OcrFailed`] — the engine failed
/// - [`TranscriptError::InvalidConfig`] — the rules do not validate
pub fn extract_report(
    image: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionReport, TranscriptError> {
    let extractor = Extractor::new(config.rules.clone())?;
    let engine = resolve_engine(config);
    run_one(&extractor, engine.as_ref(), image.as_ref())
}

/// Run the pipeline over a word stream that was recognised elsewhere.
pub fn extract_words(
    words: Vec<Word>,
    config: &ExtractionConfig,
) -> Result<ExtractionReport, TranscriptError> {
    let extractor = Extractor::new(config.rules.clone())?;
    Ok(extractor.extract_report(words))
}

/// Extract from an image held in memory.
///
/// The bytes are written to a managed [`tempfile`] that is deleted on return.
pub fn extract_from_bytes(bytes: &[u8], config: &ExtractionConfig) -> ExtractionResult {
    let written = tempfile::NamedTempFile::new().and_then(|mut tmp| {
        tmp.write_all(bytes)?;
        tmp.flush()?;
        Ok(tmp)
    });
    match written {
        // `tmp` is dropped (and the file deleted) after `extract` returns.
        Ok(tmp) => extract(tmp.path(), config),
        Err(e) => {
            ExtractionResult::failed(TranscriptError::Internal(format!("tempfile: {e}")).to_string())
        }
    }
}

/// Extract from a local path or an HTTP/HTTPS URL.
///
/// URL downloads live in a temp directory for the duration of this call only.
pub async fn extract_input(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionReport, TranscriptError> {
    let extractor = Arc::new(Extractor::new(config.rules.clone())?);
    let engine = resolve_engine(config);
    run_input(
        extractor,
        engine,
        input_str.as_ref(),
        config.download_timeout_secs,
    )
    .await
}

/// Extract and write the result as pretty JSON to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files. The
/// result is written even when it carries an error.
pub async fn extract_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, TranscriptError> {
    let result = match extract_input(input_str, config).await {
        Ok(report) => report.result,
        Err(e @ TranscriptError::InvalidConfig(_)) => return Err(e),
        Err(e) => ExtractionResult::failed(e.to_string()),
    };
    let json = serde_json::to_string_pretty(&result)
        .map_err(|e| TranscriptError::Internal(format!("serialise result: {e}")))?;
    write_atomic(output_path.as_ref(), json.as_bytes()).await?;
    Ok(result)
}

/// Extract every input, at most `config.concurrency` at a time.
///
/// Results come back in input order. A failing image does not affect the
/// others; its outcome carries the error.
pub async fn extract_batch(
    inputs: &[String],
    config: &ExtractionConfig,
) -> Result<Vec<ImageOutcome>, TranscriptError> {
    let mut outcomes: Vec<ImageOutcome> = extract_stream(inputs.to_vec(), config)?.collect().await;
    outcomes.sort_by_key(|o| o.index);

    let success_count = outcomes.iter().filter(|o| !o.result.is_error()).count();
    info!(
        "Batch complete: {}/{} images extracted",
        success_count,
        outcomes.len()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(outcomes.len(), success_count);
    }
    Ok(outcomes)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve one path or URL, then run [`run_one`] on the blocking pool.
///
/// A downloaded file is deleted once the blocking task returns.
pub(crate) async fn run_input(
    extractor: Arc<Extractor>,
    engine: Arc<dyn OcrEngine>,
    input_str: &str,
    download_timeout_secs: u64,
) -> Result<ExtractionReport, TranscriptError> {
    let resolved = input::resolve_input(input_str, download_timeout_secs).await?;

    tokio::task::spawn_blocking(move || run_one(&extractor, engine.as_ref(), resolved.path()))
        .await
        .map_err(|e| TranscriptError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// OCR one image and run the pipeline over its words.
pub(crate) fn run_one(
    extractor: &Extractor,
    engine: &dyn OcrEngine,
    image: &Path,
) -> Result<ExtractionReport, TranscriptError> {
    let start = Instant::now();
    info!("Starting extraction: {} ({})", image.display(), engine.name());

    let words = engine.recognize(image).inspect_err(|e| {
        if let TranscriptError::ImageUnreadable { path, detail } = e {
            warn!("Cannot read {}: {}", path.display(), detail);
        }
    })?;

    let mut report = extractor.extract_report(words);
    report.stats.duration_ms = start.elapsed().as_millis() as u64;

    info!(
        "Extraction complete: {} subjects, name {}, {}ms",
        report.result.subjects.len(),
        if report.result.name.is_some() { "found" } else { "missing" },
        report.stats.duration_ms
    );
    Ok(report)
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), TranscriptError> {
    let write_err = |e: std::io::Error| TranscriptError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
    }
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}
