//! Hit ranking and eligibility filtering

use crate::providers::ImageHit;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Minimum engagement an image needs; zero disables a threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFilter {
    #[serde(default)]
    pub min_likes: u64,
    #[serde(default)]
    pub min_downloads: u64,
    #[serde(default)]
    pub min_views: u64,
    #[serde(default)]
    pub min_comments: u64,
}

impl MetadataFilter {
    /// A hit must meet or exceed every threshold
    pub fn accepts(&self, hit: &ImageHit) -> bool {
        hit.likes >= self.min_likes
            && hit.downloads >= self.min_downloads
            && hit.views >= self.min_views
            && hit.comments >= self.min_comments
    }
}

/// Sort hits by (likes, downloads, views), highest first
///
/// The sort is stable: hits with equal metrics keep provider order.
pub fn rank_hits(hits: &[ImageHit]) -> Vec<ImageHit> {
    let mut ranked = hits.to_vec();
    ranked.sort_by(|a, b| b.popularity().cmp(&a.popularity()));
    ranked
}

/// First hit, in the given order, that is unused and passes the filter
pub fn first_eligible(
    hits: &[ImageHit],
    used_urls: &HashSet<String>,
    filter: &MetadataFilter,
) -> Option<ImageHit> {
    hits.iter()
        .find(|hit| !hit.url.is_empty() && !used_urls.contains(&hit.url) && filter.accepts(hit))
        .cloned()
}

/// Best eligible hit by popularity
pub fn rank_and_filter(
    hits: &[ImageHit],
    used_urls: &HashSet<String>,
    filter: &MetadataFilter,
) -> Option<ImageHit> {
    first_eligible(&rank_hits(hits), used_urls, filter)
}
