//! Search query pipeline
//!
//! Raw field -> normalized query -> synonym candidates -> optional refinement.

mod expand;
mod normalize;
mod refine;

pub use expand::{expand, ExpandedQueries};
pub use normalize::{clean_text, normalize_query};
pub use refine::{is_stop_word, lemmatize, refine};

use crate::synonyms::SynonymDictionary;

/// Build the ordered, deduplicated candidate list for one normalized query
///
/// When refinement empties a candidate, the unrefined text is kept instead.
pub fn candidate_queries(
    query: &str,
    dictionary: &SynonymDictionary,
    use_synonyms: bool,
    apply_nlp: bool,
) -> Vec<String> {
    let empty = SynonymDictionary::new();
    let dictionary = if use_synonyms { dictionary } else { &empty };

    let mut candidates: Vec<String> = Vec::new();
    for candidate in ExpandedQueries::new(query, dictionary) {
        let candidate = if apply_nlp {
            let refined = refine(&candidate);
            if refined.is_empty() {
                candidate
            } else {
                refined
            }
        } else {
            candidate
        };

        if !candidate.is_empty() && !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary() -> SynonymDictionary {
        let mut d = SynonymDictionary::new();
        d.insert(
            "fruit".to_string(),
            vec!["berry".to_string(), "fruits".to_string()],
        );
        d
    }

    #[test]
    fn test_candidates_without_synonyms() {
        let candidates = candidate_queries("a red fruit", &dictionary(), false, false);
        assert_eq!(candidates, vec!["a red fruit"]);
    }

    #[test]
    fn test_candidates_with_synonyms() {
        let candidates = candidate_queries("a red fruit", &dictionary(), true, false);
        assert_eq!(
            candidates,
            vec!["a red fruit", "a red berry", "a red fruits"]
        );
    }

    #[test]
    fn test_refinement_deduplicates() {
        let candidates = candidate_queries("a red fruit", &dictionary(), true, true);
        assert_eq!(candidates, vec!["red fruit", "red berry"]);
    }

    #[test]
    fn test_refinement_never_empties_candidate() {
        let candidates = candidate_queries("to be", &SynonymDictionary::new(), true, true);
        assert_eq!(candidates, vec!["to be"]);
    }

    #[test]
    fn test_empty_query_has_no_candidates() {
        assert!(candidate_queries("", &dictionary(), true, true).is_empty());
    }
}
