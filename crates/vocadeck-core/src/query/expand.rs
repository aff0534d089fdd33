//! Synonym-based query expansion
//!
//! Each candidate replaces exactly one token with one of its synonyms, so a
//! query of n tokens yields `1 + sum(k_i)` candidates where `k_i` is the
//! number of synonyms known for token i.

use crate::synonyms::SynonymDictionary;

/// Lazily produced candidate queries, the unmodified query first
pub struct ExpandedQueries<'a> {
    query: &'a str,
    tokens: Vec<&'a str>,
    dictionary: &'a SynonymDictionary,
    original_done: bool,
    token: usize,
    synonym: usize,
}

impl<'a> ExpandedQueries<'a> {
    pub fn new(query: &'a str, dictionary: &'a SynonymDictionary) -> Self {
        Self {
            query,
            tokens: query.split_whitespace().collect(),
            dictionary,
            original_done: false,
            token: 0,
            synonym: 0,
        }
    }

    fn substitute(&self, position: usize, replacement: &str) -> String {
        self.tokens
            .iter()
            .enumerate()
            .map(|(i, t)| if i == position { replacement } else { *t })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Iterator for ExpandedQueries<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if !self.original_done {
            self.original_done = true;
            return Some(self.query.to_string());
        }

        while self.token < self.tokens.len() {
            if let Some(synonyms) = self.dictionary.get(self.tokens[self.token]) {
                if let Some(synonym) = synonyms.get(self.synonym) {
                    self.synonym += 1;
                    return Some(self.substitute(self.token, synonym));
                }
            }
            self.token += 1;
            self.synonym = 0;
        }

        None
    }
}

/// Expand a normalized query into its ordered candidate list
pub fn expand(query: &str, dictionary: &SynonymDictionary) -> Vec<String> {
    ExpandedQueries::new(query, dictionary).collect()
}
