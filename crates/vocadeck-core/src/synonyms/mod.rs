//! Synonym dictionary with online write-through lookup
//!
//! The local JSON dictionary is consulted first. Words it does not know are
//! looked up through a [`SynonymLookup`], validated, and written back so later
//! runs stay offline.

mod datamuse;

pub use datamuse::DatamuseLookup;

use crate::error::Result;
use crate::query::is_stop_word;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Word -> ordered synonyms
pub type SynonymDictionary = BTreeMap<String, Vec<String>>;

/// Online synonym source
#[async_trait]
pub trait SynonymLookup: Send + Sync {
    /// Raw synonyms for one word, best first
    async fn lookup(&self, word: &str) -> Result<Vec<String>>;
}

/// Keep single-word synonyms that differ from the word itself, without duplicates
pub fn validate_synonyms(word: &str, synonyms: &[String]) -> Vec<String> {
    let mut valid: Vec<String> = Vec::new();
    for synonym in synonyms {
        let synonym = synonym.trim().to_lowercase();
        if synonym.is_empty() || synonym.split_whitespace().count() != 1 {
            continue;
        }
        if synonym == word || valid.contains(&synonym) {
            continue;
        }
        valid.push(synonym);
    }
    tracing::debug!("Validated synonyms for '{}': {:?}", word, valid);
    valid
}

/// Persistent synonym dictionary
pub struct SynonymStore {
    path: Option<PathBuf>,
    dictionary: SynonymDictionary,
    missed: HashSet<String>,
}

impl SynonymStore {
    /// Load the dictionary file; unreadable files yield an empty dictionary
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let dictionary = match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<SynonymDictionary>(&content) {
                Ok(dictionary) => dictionary,
                Err(e) => {
                    tracing::error!("Error parsing synonym file {:?}: {}", path, e);
                    SynonymDictionary::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    "Synonym file {:?} not found, starting with an empty dictionary",
                    path
                );
                SynonymDictionary::new()
            }
            Err(e) => {
                tracing::warn!("Could not read synonym file {:?}: {}", path, e);
                SynonymDictionary::new()
            }
        };

        Self {
            path: Some(path.to_path_buf()),
            dictionary,
            missed: HashSet::new(),
        }
    }

    /// Store that never touches the filesystem
    pub fn in_memory(dictionary: SynonymDictionary) -> Self {
        Self {
            path: None,
            dictionary,
            missed: HashSet::new(),
        }
    }

    pub fn dictionary(&self) -> &SynonymDictionary {
        &self.dictionary
    }

    pub fn get(&self, word: &str) -> Option<&[String]> {
        self.dictionary.get(word).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.dictionary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dictionary.is_empty()
    }

    /// Merge synonyms for a word, preserving order; returns true if anything was added
    pub fn merge(&mut self, word: &str, synonyms: &[String]) -> bool {
        let entry = self.dictionary.entry(word.to_string()).or_default();
        let before = entry.len();
        for synonym in synonyms {
            if !entry.contains(synonym) {
                entry.push(synonym.clone());
            }
        }
        entry.len() > before
    }

    /// Write the dictionary back to its file
    pub fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&self.dictionary)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Look up every unknown content word of `query` online
    ///
    /// Lookup failures count as "no synonyms". Each word is tried at most once
    /// per store. Returns the number of words that gained synonyms.
    pub async fn resolve(&mut self, query: &str, lookup: &dyn SynonymLookup) -> usize {
        let mut learned = 0;

        for word in query.split_whitespace() {
            if self.dictionary.contains_key(word)
                || self.missed.contains(word)
                || is_stop_word(word)
                || word.chars().all(|c| c.is_numeric())
            {
                continue;
            }

            let raw = match lookup.lookup(word).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!("Synonym lookup failed for '{}': {}", word, e);
                    Vec::new()
                }
            };

            let valid = validate_synonyms(word, &raw);
            if valid.is_empty() {
                self.missed.insert(word.to_string());
                continue;
            }

            self.merge(word, &valid);
            learned += 1;
            match self.persist() {
                Ok(()) => tracing::info!("Stored {} new synonyms for '{}'", valid.len(), word),
                Err(e) => tracing::error!("Error updating synonym file: {}", e),
            }
        }

        learned
    }
}
