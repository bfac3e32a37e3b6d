//! Progress-callback trait for batch extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as [`crate::extract::extract_batch`] or
//! [`crate::stream::extract_stream`] works through a list of images.
//!
//! # Example
//!
//! ```rust
//! use edgequake_transcript::{ExtractionProgressCallback, ExtractionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_image_complete(&self, index: usize, total: usize, subjects: usize) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{done}/{total}: image {index} yielded {subjects} subjects");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

/// Called as a batch of images is processed.
///
/// Images run concurrently, so `on_image_*` methods may be called from
/// different threads at once. Guard shared mutable state accordingly
/// (`Mutex`, atomics). Every method defaults to a no-op.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before any image is opened.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before an image is handed to the OCR engine.
    ///
    /// # Arguments
    /// * `index` — 0-based position in the input list
    /// * `total` — number of images in the batch
    /// * `input` — the path or URL as given
    fn on_image_start(&self, index: usize, total: usize, input: &str) {
        let _ = (index, total, input);
    }

    /// Called when an image produced a result without error.
    ///
    /// `subjects` is the number of subjects in the final result (possibly 0).
    fn on_image_complete(&self, index: usize, total: usize, subjects: usize) {
        let _ = (index, total, subjects);
    }

    /// Called when an image failed; `error` is the message stored in the result.
    fn on_image_error(&self, index: usize, total: usize, error: String) {
        let _ = (index, total, error);
    }

    /// Called once after every image has finished.
    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation, used when no callback is configured.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Recorder {
        started: AtomicUsize,
        errors: Mutex<Vec<String>>,
    }

    impl ExtractionProgressCallback for Recorder {
        fn on_image_start(&self, _index: usize, _total: usize, _input: &str) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }

        fn on_image_error(&self, _index: usize, _total: usize, error: String) {
            self.errors.lock().unwrap().push(error);
        }
    }

    #[test]
    fn test_noop_callback_accepts_every_event() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_image_start(0, 2, "a.png");
        cb.on_image_complete(0, 2, 5);
        cb.on_image_error(1, 2, "boom".into());
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let cb = Recorder {
            started: AtomicUsize::new(0),
            errors: Mutex::new(Vec::new()),
        };
        cb.on_batch_start(1);
        cb.on_image_start(0, 1, "scan.jpg");
        cb.on_image_error(0, 1, "Could not read image file".into());
        cb.on_batch_complete(1, 0);
        assert_eq!(cb.started.load(Ordering::SeqCst), 1);
        assert_eq!(cb.errors.lock().unwrap().len(), 1);
    }
}
