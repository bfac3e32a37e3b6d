//! Image preparation for OCR: grayscale + automatic (Otsu) threshold.
//!
//! Phone photos of transcripts have uneven lighting, coloured paper and
//! watermarks. Tesseract reads them far better once every pixel is forced to
//! pure black or white. Otsu's method picks the threshold that best separates
//! the ink and paper histogram peaks, so no per-image tuning is needed. This
//! step is fixed, not configurable.

use crate::error::TranscriptError;
use image::{GrayImage, ImageReader, Luma};
use std::path::Path;
use tracing::debug;

/// Decode `path` and return its binarised grayscale image.
///
/// The format is sniffed from the file contents, so temp files and downloads
/// without an extension decode too. Any decode failure (missing file, unknown
/// format, truncated data) is reported as [`TranscriptError::ImageUnreadable`].
pub fn load_binarized(path: &Path) -> Result<GrayImage, TranscriptError> {
    let img = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| TranscriptError::unreadable(path, e))?
        .decode()
        .map_err(|e| TranscriptError::unreadable(path, e))?;
    let gray = img.to_luma8();
    let threshold = otsu_threshold(&gray);
    debug!(
        "Binarising {}x{} image at threshold {}",
        gray.width(),
        gray.height(),
        threshold
    );
    Ok(binarize(&gray, threshold))
}

/// Otsu threshold of an 8-bit grayscale image.
///
/// Returns the level `t` maximising the between-class variance of
/// `[0, t]` vs `(t, 255]`. Uniform images return 0.
pub fn otsu_threshold(image: &GrayImage) -> u8 {
    let mut hist = [0u64; 256];
    for Luma([v]) in image.pixels() {
        hist[*v as usize] += 1;
    }

    let total: u64 = hist.iter().sum();
    if total == 0 {
        return 0;
    }
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut sum_bg = 0f64;
    let mut weight_bg = 0u64;
    let mut best_variance = -1f64;
    let mut threshold = 0u8;

    for (i, &count) in hist.iter().enumerate() {
        weight_bg += count;
        if weight_bg == 0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0 {
            break;
        }
        sum_bg += i as f64 * count as f64;

        let mean_bg = sum_bg / weight_bg as f64;
        let mean_fg = (sum_total - sum_bg) / weight_fg as f64;
        let diff = mean_bg - mean_fg;
        let variance = weight_bg as f64 * weight_fg as f64 * diff * diff;

        if variance > best_variance {
            best_variance = variance;
            threshold = i as u8;
        }
    }
    threshold
}

/// Map pixels above `threshold` to white and the rest to black.
pub fn binarize(image: &GrayImage, threshold: u8) -> GrayImage {
    let mut out = image.clone();
    for Luma([v]) in out.pixels_mut() {
        *v = if *v > threshold { 255 } else { 0 };
    }
    out
}
