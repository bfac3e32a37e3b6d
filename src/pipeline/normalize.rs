//! Stage 4 — normalisation and plausibility filtering.
//!
//! The last pass before results leave the crate:
//!
//! 1. Strip form boilerplate ("INDEX NO", "CERTIFICATE") from the name.
//! 2. Truncate over-long marks to their leading digits (OCR glues a stray
//!    digit onto a mark: 956 → 95).
//! 3. Drop subjects whose mark is still outside the plausible range.
//!
//! Rejected subjects are simply absent from the result. They are reported
//! back to the caller as [`DroppedCandidate::ImplausibleMark`] and never
//! logged.

use crate::config::{MarkRules, NameRules};
use crate::error::DroppedCandidate;
use crate::output::SubjectMark;
use crate::pipeline::text::title_case;

/// Remove boilerplate tokens from a raw name and title-case the rest.
///
/// Returns `None` when nothing is left.
pub fn clean_name(raw: Option<&str>, rules: &NameRules) -> Option<String> {
    let raw = raw?;
    let kept: Vec<&str> = raw
        .split_whitespace()
        .filter(|part| {
            let upper = part.to_uppercase();
            !rules
                .boilerplate
                .iter()
                .any(|b| b.trim().to_uppercase() == upper)
        })
        .collect();
    let cleaned = title_case(kept.join(" ").trim());
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Cut a mark above `rules.max` down to its first `rules.overflow_keep_digits`
/// decimal digits. Marks within the limit pass through unchanged.
pub fn truncate_mark(mark: u32, rules: &MarkRules) -> u32 {
    if mark <= rules.max {
        return mark;
    }
    let digits = mark.to_string();
    let keep = rules.overflow_keep_digits.min(digits.len());
    digits[..keep].parse().unwrap_or(mark)
}

/// Apply truncation and the plausibility filter to raw subject marks.
///
/// Returns the surviving subjects in their original order, plus one
/// [`DroppedCandidate::ImplausibleMark`] per rejected subject.
pub fn filter_marks(
    raw: Vec<SubjectMark>,
    rules: &MarkRules,
) -> (Vec<SubjectMark>, Vec<DroppedCandidate>) {
    let mut kept = Vec::with_capacity(raw.len());
    let mut dropped = Vec::new();
    for entry in raw {
        let normalised = truncate_mark(entry.marks, rules);
        if rules.is_plausible(normalised) {
            kept.push(SubjectMark {
                subject: title_case(&entry.subject),
                marks: normalised,
            });
        } else {
            dropped.push(DroppedCandidate::ImplausibleMark {
                subject: entry.subject,
                raw: entry.marks,
                normalised,
            });
        }
    }
    (kept, dropped)
}
