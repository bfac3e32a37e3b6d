//! Keyword tables used to recognise subjects, marks, and names.
//!
//! The defaults target the English-language secondary-school transcripts the
//! heuristics were tuned on. Every table is plain data carried by
//! [`crate::config::ExtractionRules`]; swap them there (or with the CLI
//! `--rules` / `--subjects` flags) to read transcripts from another board or
//! language without touching the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Subject keywords looked for (as substrings) in each upper-cased line.
pub const DEFAULT_SUBJECT_KEYWORDS: &[&str] = &[
    "ENGLISH",
    "DZONGKHA",
    "HISTORY",
    "CIVICS",
    "GEOGRAPHY",
    "MATHS",
    "SCIENCE",
    "COMPUTER",
    "APPLICATIONS",
    "PHYSICS",
    "CHEMISTRY",
    "MATHEMATICS",
];

/// Spelled-out digit words and the digit each stands for.
pub const DEFAULT_DIGIT_WORDS: &[(&str, u8)] = &[
    ("ZERO", 0),
    ("ONE", 1),
    ("TWO", 2),
    ("THREE", 3),
    ("FOUR", 4),
    ("FIVE", 5),
    ("SIX", 6),
    ("SEVEN", 7),
    ("EIGHT", 8),
    ("NINE", 9),
];

/// Token that introduces the student's name.
pub const DEFAULT_NAME_ANCHOR: &str = "Name";

/// Form labels that OCR tends to sweep into the name window.
pub const DEFAULT_NAME_BOILERPLATE: &[&str] = &["INDEX", "NO", "CERTIFICATE"];

/// Closed list of known subject keywords.
///
/// No fuzzy matching: a keyword either appears verbatim (case-insensitively)
/// in a line or it does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SubjectVocabulary(Vec<String>);

impl SubjectVocabulary {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            keywords
                .into_iter()
                .map(|k| k.into().trim().to_uppercase())
                .collect(),
        )
    }

    pub fn keywords(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every keyword contained in `haystack`, in vocabulary order.
    ///
    /// `haystack` must already be upper-cased.
    pub fn matches<'a>(&'a self, haystack: &str) -> Vec<&'a str> {
        self.0
            .iter()
            .filter(|kw| !kw.is_empty() && haystack.contains(kw.as_str()))
            .map(String::as_str)
            .collect()
    }
}

impl From<Vec<String>> for SubjectVocabulary {
    fn from(keywords: Vec<String>) -> Self {
        Self::new(keywords)
    }
}

impl From<SubjectVocabulary> for Vec<String> {
    fn from(v: SubjectVocabulary) -> Self {
        v.0
    }
}

impl Default for SubjectVocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_SUBJECT_KEYWORDS.iter().copied())
    }
}

/// Mapping from spelled-out digit words to digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, u8>", into = "BTreeMap<String, u8>")]
pub struct DigitWords(BTreeMap<String, u8>);

impl DigitWords {
    pub fn new<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u8)>,
        S: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(w, d)| (w.into().trim().to_uppercase(), d))
                .collect(),
        )
    }

    /// The digit spelled by `token`, compared case-insensitively.
    pub fn digit(&self, token: &str) -> Option<u8> {
        self.0.get(&token.to_uppercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.0.iter().map(|(w, d)| (w.as_str(), *d))
    }
}

impl From<BTreeMap<String, u8>> for DigitWords {
    fn from(map: BTreeMap<String, u8>) -> Self {
        Self::new(map)
    }
}

impl From<DigitWords> for BTreeMap<String, u8> {
    fn from(d: DigitWords) -> Self {
        d.0
    }
}

impl Default for DigitWords {
    fn default() -> Self {
        Self::new(DEFAULT_DIGIT_WORDS.iter().copied())
    }
}
