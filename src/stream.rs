//! Streaming batch API: emit one outcome per image as it completes.
//!
//! A folder of scanned transcripts can take a while to OCR. Streaming lets
//! callers print or persist each result immediately instead of waiting for
//! the slowest image. Outcomes arrive in completion order; sort by
//! [`ImageOutcome::index`] if input order matters ([`crate::extract_batch`]
//! does exactly that).

use crate::config::ExtractionConfig;
use crate::error::TranscriptError;
use crate::extract::run_input;
use crate::extractor::Extractor;
use crate::ocr::resolve_engine;
use crate::output::{ExtractionResult, ImageOutcome};
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::{info, warn};

/// A boxed stream of per-image outcomes.
pub type OutcomeStream = Pin<Box<dyn Stream<Item = ImageOutcome> + Send>>;

/// Extract every input, yielding each outcome as soon as it is ready.
///
/// At most `config.concurrency` images are in flight. An image that fails
/// still yields an outcome whose `result.error` says why.
///
/// Fires `on_batch_start` immediately and `on_image_*` per image.
/// `on_batch_complete` is left to the caller, who knows when it stopped
/// polling.
///
/// # Returns
/// - `Ok(OutcomeStream)` — one [`ImageOutcome`] per input
/// - `Err(TranscriptError)` — the rules in `config` are invalid
///
/// # Example
/// ```rust,no_run
/// use edgequake_transcript::{extract_stream, ExtractionConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let inputs = vec!["a.jpg".to_string(), "b.png".to_string()];
/// let mut outcomes = extract_stream(inputs, &ExtractionConfig::default())?;
/// while let Some(outcome) = outcomes.next().await {
///     println!("{}: {}", outcome.input, serde_json::to_string(&outcome.result)?);
/// }
/// # Ok(())
/// # }
/// ```
pub fn extract_stream(
    inputs: Vec<String>,
    config: &ExtractionConfig,
) -> Result<OutcomeStream, TranscriptError> {
    let extractor = Arc::new(Extractor::new(config.rules.clone())?);
    let engine = resolve_engine(config);
    let total = inputs.len();
    let concurrency = config.concurrency.max(1);
    let timeout_secs = config.download_timeout_secs;
    let progress = config.progress_callback.clone();

    info!(
        "Extracting {} image(s) with {} ({} at a time)",
        total,
        engine.name(),
        concurrency
    );
    if let Some(ref cb) = progress {
        cb.on_batch_start(total);
    }

    let s = stream::iter(inputs.into_iter().enumerate().map(move |(index, input)| {
        let extractor = Arc::clone(&extractor);
        let engine = Arc::clone(&engine);
        let progress = progress.clone();
        async move {
            if let Some(ref cb) = progress {
                cb.on_image_start(index, total, &input);
            }
            let result = match run_input(extractor, engine, &input, timeout_secs).await {
                Ok(report) => {
                    if let Some(ref cb) = progress {
                        cb.on_image_complete(index, total, report.result.subjects.len());
                    }
                    report.result
                }
                Err(e) => {
                    warn!("Image {} ({}) failed: {}", index + 1, input, e);
                    if let Some(ref cb) = progress {
                        cb.on_image_error(index, total, e.to_string());
                    }
                    ExtractionResult::failed(e.to_string())
                }
            };
            ImageOutcome {
                input,
                index,
                result,
            }
        }
    }))
    .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}
