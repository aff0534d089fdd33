//! Stop-word removal and lemmatization of candidate queries

use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};

lazy_static! {
    static ref STOP_WORDS: HashSet<&'static str> = [
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
        "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
        "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
        "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
        "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
        "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
        "for", "with", "about", "against", "between", "into", "through", "during", "before",
        "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
        "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
        "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
        "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can",
        "will", "just", "don", "should", "now", "something", "someone", "somebody",
    ]
    .into_iter()
    .collect();

    static ref IRREGULAR: HashMap<&'static str, &'static str> = [
        ("children", "child"),
        ("men", "man"),
        ("women", "woman"),
        ("people", "person"),
        ("mice", "mouse"),
        ("geese", "goose"),
        ("feet", "foot"),
        ("teeth", "tooth"),
        ("oxen", "ox"),
        ("leaves", "leaf"),
        ("knives", "knife"),
        ("wives", "wife"),
        ("lives", "life"),
        ("wolves", "wolf"),
        ("halves", "half"),
        ("shelves", "shelf"),
        ("loaves", "loaf"),
        ("potatoes", "potato"),
        ("tomatoes", "tomato"),
        ("heroes", "hero"),
    ]
    .into_iter()
    .collect();
}

/// Words that never need reducing even though they end in "s"
const S_ENDINGS_KEPT: &[&str] = &["ss", "us", "is", "ous"];

/// Reduce a lowercase noun to its dictionary base form
pub fn lemmatize(word: &str) -> String {
    if let Some(base) = IRREGULAR.get(word) {
        return base.to_string();
    }
    if word.chars().count() <= 3 || !word.ends_with('s') {
        return word.to_string();
    }
    if S_ENDINGS_KEPT.iter().any(|e| word.ends_with(e)) {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        if stem.chars().count() >= 2 {
            return format!("{}y", stem);
        }
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    word[..word.len() - 1].to_string()
}

/// Whether a lowercase token is an English stop word
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

/// Drop stop words and lemmatize the remaining tokens
///
/// Returns an empty string when every token is a stop word.
pub fn refine(query: &str) -> String {
    let refined: Vec<String> = query
        .split_whitespace()
        .filter(|w| !is_stop_word(&w.to_lowercase()))
        .map(|w| lemmatize(&w.to_lowercase()))
        .collect();
    let refined = refined.join(" ");
    tracing::debug!("Refined query '{}' -> '{}'", query, refined);
    refined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lemmatize_regular_plurals() {
        assert_eq!(lemmatize("apples"), "apple");
        assert_eq!(lemmatize("berries"), "berry");
        assert_eq!(lemmatize("boxes"), "box");
        assert_eq!(lemmatize("churches"), "church");
        assert_eq!(lemmatize("glasses"), "glass");
    }

    #[test]
    fn test_lemmatize_keeps_singulars() {
        assert_eq!(lemmatize("glass"), "glass");
        assert_eq!(lemmatize("bus"), "bus");
        assert_eq!(lemmatize("analysis"), "analysis");
        assert_eq!(lemmatize("famous"), "famous");
        assert_eq!(lemmatize("gas"), "gas");
        assert_eq!(lemmatize("dog"), "dog");
    }

    #[test]
    fn test_lemmatize_irregular() {
        assert_eq!(lemmatize("children"), "child");
        assert_eq!(lemmatize("leaves"), "leaf");
        assert_eq!(lemmatize("mice"), "mouse");
    }

    #[test]
    fn test_refine_removes_stop_words() {
        assert_eq!(refine("a red fruit"), "red fruit");
        assert_eq!(refine("the children of the village"), "child village");
    }

    #[test]
    fn test_refine_all_stop_words() {
        assert_eq!(refine("to be or not to be"), "");
    }

    #[test]
    fn test_refine_is_deterministic() {
        let query = "tall trees in the forests";
        assert_eq!(refine(query), refine(query));
        assert_eq!(refine(query), "tall tree forest");
    }
}
