//! Pipeline stages for transcript extraction.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the OCR backend can change without touching the
//! text rules.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ binarize ──▶ (OCR) ──▶ ingest ──▶ lines ──▶ subjects/marks/name ──▶ normalize
//! (URL/path) (Otsu)     (words)   (filter)   (group)    (record extraction)     (cleanup)
//! ```
//!
//! 1. [`input`]     — canonicalise the user-supplied path or URL to a local file
//! 2. [`binarize`]  — decode, grayscale and Otsu-threshold the image for OCR
//! 3. [`ingest`]    — drop empty and low-confidence words
//! 4. [`lines`]     — group words by line and sort each line left to right
//! 5. [`subjects`], [`marks`], [`name`] — find subject labels, their marks,
//!    and the student name
//! 6. [`normalize`] — title-case, strip name boilerplate, repair and range-check
//!    marks
//!
//! [`text`] holds the token predicates and the title-case rule the other
//! stages share.

pub mod binarize;
pub mod ingest;
pub mod input;
pub mod lines;
pub mod marks;
pub mod name;
pub mod normalize;
pub mod subjects;
pub mod text;
