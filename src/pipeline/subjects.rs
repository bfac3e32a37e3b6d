//! Stage 3a — subject keyword detection and label canonicalisation.
//!
//! A line is joined into one upper-cased string and searched for every
//! vocabulary keyword as a plain substring. OCR often splits or glues
//! multi-word subject names ("COMPUTER APPLICATIONS", "COMPUTERAPPLICATIONS"),
//! and substring search tolerates both. Several hits on one line form a
//! composite subject: deduplicated, sorted, space-joined.

use crate::pipeline::text::title_case;
use crate::vocabulary::SubjectVocabulary;
use std::collections::BTreeSet;

/// The composite subject for a line, or `None` when no keyword matches.
///
/// Returned upper-case, e.g. `"APPLICATIONS COMPUTER"`.
pub fn detect_subject(vocabulary: &SubjectVocabulary, words: &[&str]) -> Option<String> {
    let haystack = words.join(" ").to_uppercase();
    let hits: BTreeSet<&str> = vocabulary.matches(&haystack).into_iter().collect();
    if hits.is_empty() {
        None
    } else {
        Some(hits.into_iter().collect::<Vec<_>>().join(" "))
    }
}

/// Canonical display label for a composite subject.
///
/// Title-cases, then splits, deduplicates, sorts and re-joins, so the same
/// set of keywords always yields the same label.
pub fn canonical_label(composite: &str) -> String {
    let titled = title_case(composite);
    let parts: BTreeSet<&str> = titled.split_whitespace().collect();
    parts.into_iter().collect::<Vec<_>>().join(" ")
}
