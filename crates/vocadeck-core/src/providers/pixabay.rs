//! Pixabay provider
//!
//! Primary image source. Reports likes, downloads, views and comments, and
//! supports the editor's-choice flag used for strict searches.

use super::http::{build_client, send_with_retry, RetryPolicy};
use super::{ImageHit, ImageProvider, Orientation, SearchParams};
use crate::config::ProviderSettings;
use crate::error::{Result, VocadeckError};
use serde::Deserialize;

/// Public Pixabay search endpoint
pub const PIXABAY_API_URL: &str = "https://pixabay.com/api/";

const DEFAULT_PER_PAGE: u32 = 20;
const MIN_PER_PAGE: u32 = 3;
const MAX_PER_PAGE: u32 = 200;

/// Pixabay image search
pub struct PixabayProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    per_page: u32,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct PixabayResponse {
    #[serde(default)]
    hits: Vec<PixabayHit>,
}

#[derive(Deserialize)]
struct PixabayHit {
    #[serde(rename = "webformatURL", default)]
    webformat_url: String,
    #[serde(default)]
    user: String,
    #[serde(default)]
    likes: u64,
    #[serde(default)]
    downloads: u64,
    #[serde(default)]
    views: u64,
    #[serde(default)]
    comments: u64,
}

impl From<PixabayHit> for ImageHit {
    fn from(hit: PixabayHit) -> Self {
        Self {
            credit: format!("Image by {} from Pixabay", hit.user),
            url: hit.webformat_url,
            likes: hit.likes,
            downloads: hit.downloads,
            views: hit.views,
            comments: hit.comments,
        }
    }
}

impl PixabayProvider {
    /// Create new Pixabay provider
    pub fn new(api_key: impl Into<String>, settings: &ProviderSettings) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(VocadeckError::Config("Pixabay API key is missing".to_string()));
        }

        Ok(Self {
            client: build_client(settings)?,
            api_key,
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| PIXABAY_API_URL.to_string()),
            per_page: settings.per_page.unwrap_or(DEFAULT_PER_PAGE),
            retry: RetryPolicy::from_settings(settings),
        })
    }

    fn query_pairs(&self, query: &str, params: &SearchParams) -> Vec<(&'static str, String)> {
        let per_page = params
            .per_page
            .unwrap_or(self.per_page)
            .clamp(MIN_PER_PAGE, MAX_PER_PAGE);
        let orientation = match params.orientation {
            Orientation::Horizontal => "horizontal",
            Orientation::Vertical => "vertical",
            Orientation::All => "all",
        };

        vec![
            ("key", self.api_key.clone()),
            ("q", params.search_text(query)),
            ("image_type", params.image_type.clone()),
            ("orientation", orientation.to_string()),
            ("safesearch", params.safe_search.to_string()),
            ("per_page", per_page.to_string()),
            ("order", params.order.clone()),
            ("editors_choice", params.curated.to_string()),
        ]
    }
}

#[async_trait::async_trait]
impl ImageProvider for PixabayProvider {
    fn name(&self) -> &'static str {
        "pixabay"
    }

    async fn search(&self, query: &str, params: &SearchParams) -> Result<Vec<ImageHit>> {
        let request = self
            .client
            .get(&self.base_url)
            .query(&self.query_pairs(query, params));

        let response = send_with_retry(self.name(), request, &self.retry).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VocadeckError::Provider(format!(
                "Pixabay API error {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            )));
        }

        let body = response.text().await?;
        match serde_json::from_str::<PixabayResponse>(&body) {
            Ok(parsed) => {
                tracing::debug!("Pixabay returned {} hits for '{}'", parsed.hits.len(), query);
                Ok(parsed.hits.into_iter().map(ImageHit::from).collect())
            }
            Err(e) => {
                tracing::warn!("Malformed Pixabay response for '{}': {}", query, e);
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> PixabayProvider {
        PixabayProvider::new("secret", &ProviderSettings::default()).unwrap()
    }

    #[test]
    fn test_hit_conversion() {
        let raw: PixabayResponse = serde_json::from_str(
            r#"{"total": 1, "hits": [{"webformatURL": "https://cdn/x.jpg", "user": "anna",
                "likes": 4, "downloads": 10, "views": 99, "comments": 2}]}"#,
        )
        .unwrap();
        let hit = ImageHit::from(raw.hits.into_iter().next().unwrap());
        assert_eq!(hit.url, "https://cdn/x.jpg");
        assert_eq!(hit.credit, "Image by anna from Pixabay");
        assert_eq!(hit.popularity(), (4, 10, 99));
        assert_eq!(hit.comments, 2);
    }

    #[test]
    fn test_missing_metrics_default_to_zero() {
        let raw: PixabayResponse =
            serde_json::from_str(r#"{"hits": [{"webformatURL": "u", "user": "x"}]}"#).unwrap();
        let hit = ImageHit::from(raw.hits.into_iter().next().unwrap());
        assert_eq!(hit.popularity(), (0, 0, 0));
    }

    #[test]
    fn test_query_pairs() {
        let params = SearchParams {
            curated: true,
            tags: vec!["food".to_string()],
            per_page: Some(1),
            ..Default::default()
        };
        let pairs = provider().query_pairs("apple", &params);
        let get = |k: &str| {
            pairs
                .iter()
                .find(|(key, _)| *key == k)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(get("q"), "apple food");
        assert_eq!(get("per_page"), "3");
        assert_eq!(get("editors_choice"), "true");
        assert_eq!(get("image_type"), "photo");
        assert_eq!(get("safesearch"), "true");
        assert_eq!(get("order"), "popular");
        assert_eq!(get("orientation"), "horizontal");
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(PixabayProvider::new("", &ProviderSettings::default()).is_err());
    }
}
