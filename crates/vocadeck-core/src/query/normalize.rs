//! Query normalization

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^\w\s]").expect("valid regex");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
}

/// Strip punctuation, collapse whitespace and trim. Case is kept.
pub fn clean_text(input: &str) -> String {
    let cleaned = NON_WORD.replace_all(input, "");
    WHITESPACE.replace_all(&cleaned, " ").trim().to_string()
}

/// Canonical search form of a field: cleaned and lowercased
///
/// An empty result means the field has nothing searchable.
pub fn normalize_query(input: &str) -> String {
    clean_text(input).to_lowercase()
}
