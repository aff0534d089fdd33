//! Datamuse thesaurus client

use super::SynonymLookup;
use crate::config::SynonymConfig;
use crate::error::{Result, VocadeckError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Synonym lookup against the Datamuse `words?rel_syn=` endpoint
pub struct DatamuseLookup {
    client: reqwest::Client,
    base_url: String,
    max_results: usize,
}

#[derive(Deserialize)]
struct DatamuseWord {
    word: String,
}

impl DatamuseLookup {
    pub fn new(config: &SynonymConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(crate::USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.lookup_url.trim_end_matches('/').to_string(),
            max_results: config.max_results,
        })
    }
}

#[async_trait]
impl SynonymLookup for DatamuseLookup {
    async fn lookup(&self, word: &str) -> Result<Vec<String>> {
        let url = format!("{}/words", self.base_url);
        let max = self.max_results.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("rel_syn", word), ("max", max.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VocadeckError::Provider(format!(
                "Datamuse returned {} for '{}'",
                status.as_u16(),
                word
            )));
        }

        let words: Vec<DatamuseWord> = response.json().await?;
        Ok(words.into_iter().map(|w| w.word).collect())
    }
}
