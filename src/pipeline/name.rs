//! Stage 3c — candidate name extraction.
//!
//! Works on the flat word stream, not on lines: transcripts print the name
//! right after a "Name" label, but OCR frequently puts the label and the name
//! on different reported lines.

use crate::output::Word;
use crate::pipeline::text::{is_alphabetic, title_case};
use regex::{Regex, RegexBuilder};

/// Finds the name anchor and reads the words after it.
#[derive(Debug, Clone)]
pub struct NameFinder {
    anchor: Regex,
    window: usize,
}

impl NameFinder {
    /// Build a finder for `anchor` (matched case-insensitively anywhere inside a word).
    pub fn new(anchor: &str, window: usize) -> Result<Self, regex::Error> {
        let anchor = RegexBuilder::new(&regex::escape(anchor.trim()))
            .case_insensitive(true)
            .build()?;
        Ok(Self { anchor, window })
    }

    /// The raw candidate name, or `None` if no anchor is present or no
    /// alphabetic word follows it inside the window.
    ///
    /// Only the first anchor counts. Non-alphabetic words inside the window
    /// ("No.", "1234", ":") are skipped but still use up a slot.
    pub fn find(&self, words: &[Word]) -> Option<String> {
        let anchor_at = words.iter().position(|w| self.anchor.is_match(&w.text))?;
        let candidate: Vec<String> = words
            .iter()
            .skip(anchor_at + 1)
            .take(self.window)
            .map(|w| w.text.as_str())
            .filter(|t| is_alphabetic(t))
            .map(title_case)
            .collect();
        if candidate.is_empty() {
            None
        } else {
            Some(candidate.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(texts: &[&str]) -> Vec<Word> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Word::new(*t, 90.0, 1, i as f32))
            .collect()
    }

    fn finder() -> NameFinder {
        NameFinder::new("Name", 4).unwrap()
    }

    #[test]
    fn test_takes_window_after_anchor() {
        let w = words(&["Student", "Name:", "JOHN", "DOE", "Class", "X", "Science"]);
        assert_eq!(finder().find(&w), Some("John Doe Class X".into()));
    }

    #[test]
    fn test_anchor_is_case_insensitive_substring() {
        let w = words(&["STUDENTNAME", "jane", "roe"]);
        assert_eq!(finder().find(&w), Some("Jane Roe".into()));
    }

    #[test]
    fn test_non_alphabetic_tokens_use_a_slot() {
        let w = words(&["Name", ":", "Tashi", "12345", "Dorji", "Wangmo"]);
        // Window covers ":", "Tashi", "12345", "Dorji"; "Wangmo" is outside.
        assert_eq!(finder().find(&w), Some("Tashi Dorji".into()));
    }

    #[test]
    fn test_first_anchor_wins() {
        let w = words(&["Name", "Pema", "School", "Name", "Druk"]);
        assert_eq!(finder().find(&w), Some("Pema School Name Druk".into()));
    }

    #[test]
    fn test_window_truncated_at_end_of_stream() {
        let w = words(&["Name", "Sonam"]);
        assert_eq!(finder().find(&w), Some("Sonam".into()));
    }

    #[test]
    fn test_no_anchor() {
        let w = words(&["ENGLISH", "85"]);
        assert_eq!(finder().find(&w), None);
    }

    #[test]
    fn test_anchor_without_alphabetic_followers() {
        let w = words(&["Name", "-", "0042"]);
        assert_eq!(finder().find(&w), None);
    }

    #[test]
    fn test_anchor_with_regex_metacharacters_is_literal() {
        let f = NameFinder::new("Name(s)", 2).unwrap();
        let w = words(&["Names", "Karma", "Name(s)", "Yeshi"]);
        assert_eq!(f.find(&w), Some("Yeshi".into()));
    }
}
