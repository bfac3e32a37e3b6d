//! Token-level helpers shared by the extraction stages.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());

/// True when `token` is one or more ASCII digits and nothing else.
pub fn is_numeric(token: &str) -> bool {
    RE_NUMERIC.is_match(token)
}

/// True when `token` is non-empty and every character is alphabetic.
pub fn is_alphabetic(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphabetic)
}

/// Title-case `s`: a letter is upper-cased when it starts a run of letters
/// and lower-cased otherwise.
///
/// Any non-letter starts a new run, so `o'neil` becomes `O'Neil` and
/// `MATHS-II` becomes `Maths-Ii`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
