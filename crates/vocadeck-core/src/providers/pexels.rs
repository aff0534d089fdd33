//! Pexels provider
//!
//! Fallback image source. Pexels reports no engagement metrics, so its hits
//! rank as zero popularity and only pass permissive metadata filters.

use super::http::{build_client, send_with_retry, RetryPolicy};
use super::{ImageHit, ImageProvider, Orientation, SearchParams};
use crate::config::ProviderSettings;
use crate::error::{Result, VocadeckError};
use serde::Deserialize;

/// Public Pexels search endpoint
pub const PEXELS_API_URL: &str = "https://api.pexels.com/v1/search";

const DEFAULT_PER_PAGE: u32 = 15;
const MAX_PER_PAGE: u32 = 80;

/// Pexels image search
pub struct PexelsProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    per_page: u32,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct PexelsResponse {
    #[serde(default)]
    photos: Vec<PexelsPhoto>,
}

#[derive(Deserialize)]
struct PexelsPhoto {
    #[serde(default)]
    url: String,
    #[serde(default)]
    photographer: String,
    #[serde(default)]
    src: PexelsSource,
}

#[derive(Deserialize, Default)]
struct PexelsSource {
    #[serde(default)]
    medium: String,
}

impl From<PexelsPhoto> for ImageHit {
    fn from(photo: PexelsPhoto) -> Self {
        Self {
            url: photo.src.medium,
            credit: format!(
                "Photo by {} on <a href='{}'>Pexels</a>",
                photo.photographer, photo.url
            ),
            likes: 0,
            downloads: 0,
            views: 0,
            comments: 0,
        }
    }
}

impl PexelsProvider {
    /// Create new Pexels provider
    pub fn new(api_key: impl Into<String>, settings: &ProviderSettings) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(VocadeckError::Config("Pexels API key is missing".to_string()));
        }

        Ok(Self {
            client: build_client(settings)?,
            api_key,
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| PEXELS_API_URL.to_string()),
            per_page: settings.per_page.unwrap_or(DEFAULT_PER_PAGE),
            retry: RetryPolicy::from_settings(settings),
        })
    }

    fn query_pairs(&self, query: &str, params: &SearchParams) -> Vec<(&'static str, String)> {
        let per_page = params
            .per_page
            .unwrap_or(self.per_page)
            .clamp(1, MAX_PER_PAGE);

        let mut pairs = vec![
            ("query", params.search_text(query)),
            ("per_page", per_page.to_string()),
        ];
        match params.orientation {
            Orientation::Horizontal => pairs.push(("orientation", "landscape".to_string())),
            Orientation::Vertical => pairs.push(("orientation", "portrait".to_string())),
            Orientation::All => {}
        }
        pairs
    }
}

#[async_trait::async_trait]
impl ImageProvider for PexelsProvider {
    fn name(&self) -> &'static str {
        "pexels"
    }

    async fn search(&self, query: &str, params: &SearchParams) -> Result<Vec<ImageHit>> {
        let request = self
            .client
            .get(&self.base_url)
            .header("Authorization", &self.api_key)
            .query(&self.query_pairs(query, params));

        let response = send_with_retry(self.name(), request, &self.retry).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VocadeckError::Provider(format!(
                "Pexels API error {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            )));
        }

        let body = response.text().await?;
        match serde_json::from_str::<PexelsResponse>(&body) {
            Ok(parsed) => {
                tracing::debug!("Pexels returned {} photos for '{}'", parsed.photos.len(), query);
                Ok(parsed.photos.into_iter().map(ImageHit::from).collect())
            }
            Err(e) => {
                tracing::warn!("Malformed Pexels response for '{}': {}", query, e);
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_conversion() {
        let raw: PexelsResponse = serde_json::from_str(
            r#"{"photos": [{"url": "https://pexels.com/p/1", "photographer": "Ben",
                "src": {"medium": "https://images.pexels.com/1.jpg"}}]}"#,
        )
        .unwrap();
        let hit = ImageHit::from(raw.photos.into_iter().next().unwrap());
        assert_eq!(hit.url, "https://images.pexels.com/1.jpg");
        assert_eq!(
            hit.credit,
            "Photo by Ben on <a href='https://pexels.com/p/1'>Pexels</a>"
        );
        assert_eq!(hit.popularity(), (0, 0, 0));
    }

    #[test]
    fn test_query_pairs_map_orientation() {
        let provider = PexelsProvider::new("k", &ProviderSettings::default()).unwrap();
        let pairs = provider.query_pairs("apple", &SearchParams::default());
        assert!(pairs.contains(&("orientation", "landscape".to_string())));
        assert!(pairs.contains(&("per_page", "15".to_string())));

        let params = SearchParams {
            orientation: Orientation::All,
            ..Default::default()
        };
        let pairs = provider.query_pairs("apple", &params);
        assert!(!pairs.iter().any(|(k, _)| *k == "orientation"));
    }
}
