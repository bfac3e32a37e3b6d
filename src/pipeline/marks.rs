//! Stage 3b — mark disambiguation.
//!
//! Two strategies, in priority order:
//!
//! 1. **Spelled digits** — printed digits sometimes come back as words
//!    ("SEVEN FIVE"). When enough digit words appear, the first few are
//!    concatenated into one number.
//! 2. **Numeric scan** — the first purely numeric token inside the plausible
//!    range.
//!
//! The spelled value wins whenever it exists, even if a numeric token is also
//! present. A value of 0 counts as no value: it falls through to the numeric
//! scan, and a final 0 means the line has no mark.

use crate::config::MarkRules;
use crate::pipeline::text::is_numeric;
use crate::vocabulary::DigitWords;

/// Reconstruct a mark from spelled-out digit words.
///
/// Scans every token, keeps the digit words, and if at least
/// `rules.min_digit_words` were found concatenates the first
/// `rules.max_digit_words` of them. Returns `None` below the threshold or if
/// the digits do not fit a `u32`.
pub fn spelled_digit_mark(digit_words: &DigitWords, rules: &MarkRules, words: &[&str]) -> Option<u32> {
    let digits: Vec<u8> = words.iter().filter_map(|w| digit_words.digit(w)).collect();
    if digits.len() < rules.min_digit_words {
        return None;
    }
    let number: String = digits
        .iter()
        .take(rules.max_digit_words)
        .map(|d| char::from(b'0' + d))
        .collect();
    number.parse().ok()
}

/// The first purely numeric token whose value lies in the plausible range.
pub fn numeric_mark(rules: &MarkRules, words: &[&str]) -> Option<u32> {
    words
        .iter()
        .filter(|w| is_numeric(w))
        .filter_map(|w| w.parse::<u32>().ok())
        .find(|&m| rules.is_plausible(m))
}

/// Pick the mark for a line, spelled digits first.
pub fn detect_mark(digit_words: &DigitWords, rules: &MarkRules, words: &[&str]) -> Option<u32> {
    spelled_digit_mark(digit_words, rules, words)
        .filter(|&m| m != 0)
        .or_else(|| numeric_mark(rules, words))
        .filter(|&m| m != 0)
}
