//! The extraction pipeline over an already-recognised word stream.
//!
//! [`Extractor`] compiles [`ExtractionRules`] once (anchor regex, validated
//! tables) and then runs the four stages for any number of word streams. It
//! holds no mutable state, so one instance can serve many threads and the
//! same input always yields the same output.

use crate::config::ExtractionRules;
use crate::error::{DroppedCandidate, TranscriptError};
use crate::output::{ExtractionReport, ExtractionResult, ExtractionStats, SubjectMark, Word};
use crate::pipeline::lines::Lines;
use crate::pipeline::name::NameFinder;
use crate::pipeline::{ingest, marks, normalize, subjects};
use tracing::debug;

/// Compiled extraction rules.
#[derive(Debug, Clone)]
pub struct Extractor {
    rules: ExtractionRules,
    names: NameFinder,
}

impl Extractor {
    /// Validate `rules` and prepare them for use.
    pub fn new(rules: ExtractionRules) -> Result<Self, TranscriptError> {
        rules.validate()?;
        let names = NameFinder::new(&rules.name.anchor, rules.name.window).map_err(|e| {
            TranscriptError::InvalidConfig(format!("Name anchor '{}': {e}", rules.name.anchor))
        })?;
        Ok(Self { rules, names })
    }

    pub fn rules(&self) -> &ExtractionRules {
        &self.rules
    }

    /// Run every stage over `words` and return the cleaned result.
    pub fn extract(&self, words: Vec<Word>) -> ExtractionResult {
        self.extract_report(words).result
    }

    /// Like [`Extractor::extract`], but also returns what was dropped and why.
    ///
    /// `stats.duration_ms` is left at 0; callers timing OCR fill it in.
    pub fn extract_report(&self, words: Vec<Word>) -> ExtractionReport {
        let words_total = words.len();

        // ── Stage 1: ingestion ───────────────────────────────────────────
        let words = ingest::filter_words(words, self.rules.min_confidence);
        debug!("Kept {}/{} words", words.len(), words_total);

        // ── Stage 2: line reconstruction ─────────────────────────────────
        let lines = Lines::group(&words);
        debug!("Reconstructed {} lines", lines.len());

        // ── Stage 3: record extraction ───────────────────────────────────
        let raw_name = self.names.find(&words);

        let mut raw_subjects: Vec<SubjectMark> = Vec::new();
        let mut dropped: Vec<DroppedCandidate> = Vec::new();
        let mut subject_lines = 0usize;

        for line in lines.iter() {
            let texts = line.texts();
            let Some(composite) = subjects::detect_subject(&self.rules.vocabulary, &texts) else {
                continue;
            };
            subject_lines += 1;
            let subject = subjects::canonical_label(&composite);

            let mut candidates = texts;
            if self.rules.merge_next_line {
                if let Some(next) = lines.next_after(line.index) {
                    candidates.extend(next.texts());
                }
            }

            let Some(mark) =
                marks::detect_mark(&self.rules.digit_words, &self.rules.marks, &candidates)
            else {
                dropped.push(DroppedCandidate::NoMark {
                    line: line.index,
                    subject,
                });
                continue;
            };

            if raw_subjects.iter().any(|s| s.subject == subject) {
                dropped.push(DroppedCandidate::DuplicateSubject {
                    line: line.index,
                    subject,
                    marks: mark,
                });
                continue;
            }
            raw_subjects.push(SubjectMark {
                subject,
                marks: mark,
            });
        }
        debug!(
            "{} subject lines, {} raw subjects",
            subject_lines,
            raw_subjects.len()
        );

        // ── Stage 4: normalisation ───────────────────────────────────────
        let (subjects, rejected) = normalize::filter_marks(raw_subjects, &self.rules.marks);
        dropped.extend(rejected);
        let name = normalize::clean_name(raw_name.as_deref(), &self.rules.name);

        ExtractionReport {
            result: ExtractionResult {
                name,
                subjects,
                error: None,
            },
            dropped,
            stats: ExtractionStats {
                words_total,
                words_kept: words.len(),
                lines: lines.len(),
                subject_lines,
                duration_ms: 0,
            },
        }
    }
}
