//! Stage 1 — word stream ingestion.
//!
//! The engine reports every layout element it saw, including empty
//! block/paragraph rows and tokens it gave up on (confidence ≤ 0). Only
//! confident, non-blank words move on. Order is preserved exactly as the
//! engine supplied it; name extraction depends on that order.

use crate::output::Word;

/// Keep the words whose confidence exceeds `min_confidence` and whose text
/// is not blank.
pub fn filter_words(words: Vec<Word>, min_confidence: f32) -> Vec<Word> {
    words
        .into_iter()
        .filter(|w| w.confidence > min_confidence && !w.text.trim().is_empty())
        .collect()
}
