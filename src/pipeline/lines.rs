//! Stage 2 — line reconstruction.
//!
//! Words are bucketed by the engine's reported line index, not by pixel
//! geometry, then put in left-to-right order. Lines are visited in ascending
//! index order and each line can look up its successor (`index + 1`) so a
//! mark that OCR pushed onto the next line can still be paired with its
//! subject.

use crate::output::Word;
use std::collections::BTreeMap;

/// Words sharing one line index, ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Line<'a> {
    pub index: u32,
    pub words: Vec<&'a Word>,
}

impl<'a> Line<'a> {
    /// The words' text in reading order.
    pub fn texts(&self) -> Vec<&'a str> {
        self.words.iter().map(|w| w.text.as_str()).collect()
    }
}

/// All lines of one image, keyed by line index.
#[derive(Debug, Clone, Default)]
pub struct Lines<'a> {
    by_index: BTreeMap<u32, Line<'a>>,
}

impl<'a> Lines<'a> {
    /// Group `words` into lines.
    ///
    /// Within a line the sort is stable, so words at the same horizontal
    /// position keep the engine's order.
    pub fn group(words: &'a [Word]) -> Self {
        let mut by_index: BTreeMap<u32, Line<'a>> = BTreeMap::new();
        for word in words {
            by_index
                .entry(word.line_index)
                .or_insert_with(|| Line {
                    index: word.line_index,
                    words: Vec::new(),
                })
                .words
                .push(word);
        }
        for line in by_index.values_mut() {
            line.words
                .sort_by(|a, b| a.horizontal_position.total_cmp(&b.horizontal_position));
        }
        Self { by_index }
    }

    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }

    /// Lines in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = &Line<'a>> {
        self.by_index.values()
    }

    /// The line numbered immediately after `index`, if the engine reported one.
    pub fn next_after(&self, index: u32) -> Option<&Line<'a>> {
        index.checked_add(1).and_then(|next| self.by_index.get(&next))
    }
}
