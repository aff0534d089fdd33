//! Image search providers
//!
//! Every backend implements [`ImageProvider`] and reports hits in the same
//! normalized shape, so the fetch orchestrator can swap or chain providers
//! without caring which API answered:
//! - Pixabay (primary)
//! - Pexels (fallback)

use crate::config::{Config, FetchConfig};
use crate::error::Result;
use serde::Serialize;
use std::sync::Arc;

mod http;
pub mod pexels;
pub mod pixabay;

pub use http::{parse_retry_after, RetryPolicy};
pub use pexels::PexelsProvider;
pub use pixabay::PixabayProvider;

/// Image search backend
#[async_trait::async_trait]
pub trait ImageProvider: Send + Sync {
    /// Provider identifier (e.g., "pixabay", "pexels")
    fn name(&self) -> &'static str;

    /// Search for images. A malformed response body yields an empty list;
    /// transport failures, error statuses and exhausted rate-limit retries are errors.
    async fn search(&self, query: &str, params: &SearchParams) -> Result<Vec<ImageHit>>;
}

/// One image returned by a provider. Metrics a provider does not report are 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHit {
    /// Display URL of the image
    pub url: String,

    /// Human-readable attribution
    pub credit: String,

    pub likes: u64,
    pub downloads: u64,
    pub views: u64,
    pub comments: u64,
}

impl ImageHit {
    /// Ranking key, likes dominant
    pub fn popularity(&self) -> (u64, u64, u64) {
        (self.likes, self.downloads, self.views)
    }
}

/// Requested image orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
    All,
}

/// Provider-independent search parameters
///
/// Serialized into the cache key, so any field change yields a fresh key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchParams {
    /// Content type filter (photos only by default)
    pub image_type: String,

    pub orientation: Orientation,

    pub safe_search: bool,

    /// Page size; `None` lets the provider pick its default
    pub per_page: Option<u32>,

    /// Sort order requested from the provider
    pub order: String,

    /// Restrict to curated / editor's choice images
    pub curated: bool,

    /// Extra terms appended to the search
    pub tags: Vec<String>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            image_type: "photo".to_string(),
            orientation: Orientation::Horizontal,
            safe_search: true,
            per_page: None,
            order: "popular".to_string(),
            curated: false,
            tags: Vec::new(),
        }
    }
}

impl SearchParams {
    /// Parameters for a run's fetch configuration
    pub fn from_fetch_config(fetch: &FetchConfig) -> Self {
        Self {
            curated: fetch.strict_filters,
            tags: fetch.tags.clone(),
            ..Default::default()
        }
    }

    /// Same request without the curated-only restriction, if it had one
    pub fn relaxed(&self) -> Option<Self> {
        if !self.curated {
            return None;
        }
        Some(Self {
            curated: false,
            ..self.clone()
        })
    }

    /// Search text with tag terms appended
    pub fn search_text(&self, query: &str) -> String {
        if self.tags.is_empty() {
            query.to_string()
        } else {
            format!("{} {}", query, self.tags.join(" "))
        }
    }

    /// Stable serialization used in cache keys
    pub fn cache_repr(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Providers in priority order: the first is primary, the rest are fallbacks
#[derive(Clone, Default)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn ImageProvider>>,
}

impl ProviderChain {
    /// Create new empty chain
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Pixabay first (required), then Pexels when a key is configured
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut chain = Self::new();

        let pixabay = PixabayProvider::new(config.pixabay_api_key()?, &config.pixabay)?;
        chain.push(Arc::new(pixabay));

        match config.pexels_api_key() {
            Some(key) => chain.push(Arc::new(PexelsProvider::new(key, &config.pexels)?)),
            None => tracing::info!("No Pexels API key configured, fallback provider disabled"),
        }

        Ok(chain)
    }

    /// Append a provider at the lowest priority
    pub fn push(&mut self, provider: Arc<dyn ImageProvider>) {
        self.providers.push(provider);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ImageProvider>> {
        self.providers.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VocadeckError;

    #[test]
    fn test_relaxed_drops_curated_once() {
        let strict = SearchParams {
            curated: true,
            ..Default::default()
        };
        let relaxed = strict.relaxed().unwrap();
        assert!(!relaxed.curated);
        assert_eq!(relaxed.orientation, strict.orientation);
        assert!(relaxed.relaxed().is_none());
    }

    #[test]
    fn test_search_text_with_tags() {
        let params = SearchParams {
            tags: vec!["nature".to_string(), "food".to_string()],
            ..Default::default()
        };
        assert_eq!(params.search_text("red apple"), "red apple nature food");
        assert_eq!(SearchParams::default().search_text("red apple"), "red apple");
    }

    #[test]
    fn test_cache_repr_changes_with_params() {
        let base = SearchParams::default();
        let curated = SearchParams {
            curated: true,
            ..Default::default()
        };
        assert_eq!(base.cache_repr(), SearchParams::default().cache_repr());
        assert_ne!(base.cache_repr(), curated.cache_repr());
        assert!(base.cache_repr().contains("\"orientation\":\"horizontal\""));
    }

    #[test]
    fn test_chain_requires_pixabay_key() {
        let mut config = Config::default();
        config.pixabay.api_key = None;
        assert!(matches!(
            ProviderChain::from_config(&config),
            Err(VocadeckError::Config(_))
        ));
    }

    #[test]
    fn test_chain_order() {
        let mut config = Config::default();
        config.pixabay.api_key = Some("pix".to_string());
        let chain = ProviderChain::from_config(&config).unwrap();
        assert_eq!(chain.names(), vec!["pixabay"]);

        config.pexels.api_key = Some("pex".to_string());
        let chain = ProviderChain::from_config(&config).unwrap();
        assert_eq!(chain.names(), vec!["pixabay", "pexels"]);
    }

    #[test]
    fn test_popularity_key() {
        let hit = ImageHit {
            url: "u".to_string(),
            credit: "c".to_string(),
            likes: 1,
            downloads: 2,
            views: 3,
            comments: 4,
        };
        assert_eq!(hit.popularity(), (1, 2, 3));
    }
}
