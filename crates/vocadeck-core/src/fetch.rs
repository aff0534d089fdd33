//! Image fetch orchestration
//!
//! For one raw text field:
//! 1. Normalize and expand it into candidate queries
//! 2. Purge expired cache entries
//! 3. Walk the provider chain; per provider, try each candidate against the
//!    cache and then the provider itself
//! 4. Rank and filter hits, remember the winner and mark it used
//!
//! Provider failures never surface to the caller. A lookup that finds
//! nothing returns an empty [`FetchResult`].

use crate::cache::{cache_key, now_timestamp, CacheEntry, ImageCache};
use crate::config::FetchConfig;
use crate::error::{Result, VocadeckError};
use crate::providers::{ImageHit, ImageProvider, ProviderChain, SearchParams};
use crate::query::{candidate_queries, normalize_query};
use crate::rank::{first_eligible, rank_and_filter};
use crate::session::FetchSession;
use crate::synonyms::SynonymDictionary;
use serde::Serialize;
use std::sync::Mutex;

/// Relaxed search is issued when a strict search returns fewer hits than this
const MIN_STRICT_HITS: usize = 3;

/// Outcome of one image lookup; both fields are set or neither is
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchResult {
    pub image_url: Option<String>,
    pub credit: Option<String>,
}

impl FetchResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn found(image_url: impl Into<String>, credit: impl Into<String>) -> Self {
        Self {
            image_url: Some(image_url.into()),
            credit: Some(credit.into()),
        }
    }

    pub fn is_found(&self) -> bool {
        self.image_url.is_some()
    }
}

/// Drives candidate queries through cache and providers
pub struct ImageFetcher {
    providers: ProviderChain,
    cache: Mutex<ImageCache>,
    config: FetchConfig,
    params: SearchParams,
}

impl ImageFetcher {
    pub fn new(providers: ProviderChain, cache: ImageCache, config: FetchConfig) -> Self {
        let params = SearchParams::from_fetch_config(&config);
        Self {
            providers,
            cache: Mutex::new(cache),
            config,
            params,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn providers(&self) -> &ProviderChain {
        &self.providers
    }

    /// Run an operation against the cache. The lock is never held across an await.
    pub fn with_cache<T>(&self, op: impl FnOnce(&ImageCache) -> Result<T>) -> Result<T> {
        let cache = self
            .cache
            .lock()
            .map_err(|_| VocadeckError::Cache("cache lock poisoned".to_string()))?;
        op(&cache)
    }

    /// Find an unused image for a raw text field
    pub async fn fetch_image(
        &self,
        raw_query: &str,
        synonyms: &SynonymDictionary,
        session: &mut FetchSession,
    ) -> FetchResult {
        let query = normalize_query(raw_query);
        if query.is_empty() {
            tracing::debug!("No searchable content in {:?}", raw_query);
            return FetchResult::none();
        }

        let candidates = candidate_queries(
            &query,
            synonyms,
            self.config.use_synonyms,
            self.config.apply_nlp,
        );
        tracing::debug!("Candidate queries for '{}': {:?}", query, candidates);

        match self.with_cache(|cache| cache.purge_expired(now_timestamp())) {
            Ok(0) => {}
            Ok(n) => tracing::debug!("Purged {} expired cache entries", n),
            Err(e) => tracing::warn!("Cache purge failed: {}", e),
        }

        let params_repr = self.params.cache_repr();

        for (index, provider) in self.providers.iter().enumerate() {
            if index > 0 {
                tracing::info!(
                    "No image for '{}' from earlier providers, falling back to {}",
                    query,
                    provider.name()
                );
                session.stats.fallbacks += 1;
            }

            let base = format!("{}:{}", provider.name(), query);

            for candidate in &candidates {
                let key = cache_key(&base, &params_repr, candidate);

                if let Some(entry) = self.cached(&key) {
                    if session.mark_used(&entry.image_url) {
                        tracing::debug!("Cache hit for '{}' ({})", candidate, provider.name());
                        session.stats.cache_hits += 1;
                        return FetchResult::found(entry.image_url, entry.credit);
                    }
                    tracing::debug!("Cached image for '{}' already used this run", candidate);
                }

                if session.is_aborted() {
                    tracing::debug!("Aborted, not querying {} for '{}'", provider.name(), candidate);
                    continue;
                }

                let Some(hit) = self.search_candidate(provider.as_ref(), candidate, session).await
                else {
                    continue;
                };

                self.remember(&key, &hit);
                session.mark_used(&hit.url);
                return FetchResult::found(hit.url, hit.credit);
            }
        }

        tracing::warn!("No suitable image found for '{}'", query);
        FetchResult::none()
    }

    /// Cached entry for a key; read failures count as a miss
    fn cached(&self, key: &str) -> Option<CacheEntry> {
        match self.with_cache(|cache| cache.get(key, now_timestamp())) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Cache read failed, treating as miss: {}", e);
                None
            }
        }
    }

    fn remember(&self, key: &str, hit: &ImageHit) {
        let entry = CacheEntry::new(&hit.url, &hit.credit, now_timestamp());
        let max_size = self.config.cache_max_size;
        let stored = self.with_cache(|cache| {
            cache.put(key, &entry)?;
            cache.enforce_size_limit(max_size)
        });
        match stored {
            Ok(0) => {}
            Ok(evicted) => tracing::debug!("Evicted {} cache entries", evicted),
            Err(e) => tracing::warn!("Failed to cache image for key {}: {}", key, e),
        }
    }

    /// Query one provider for one candidate, relaxing strict filters once
    async fn search_candidate(
        &self,
        provider: &dyn ImageProvider,
        candidate: &str,
        session: &mut FetchSession,
    ) -> Option<ImageHit> {
        let mut hits = self.search_logged(provider, candidate, &self.params, session).await?;

        if hits.len() < MIN_STRICT_HITS {
            if let Some(relaxed) = self.params.relaxed() {
                if !session.is_aborted() {
                    tracing::debug!(
                        "Only {} strict hits for '{}', retrying without curated filter",
                        hits.len(),
                        candidate
                    );
                    session.stats.relaxed_searches += 1;
                    if let Some(more) = self.search_logged(provider, candidate, &relaxed, session).await
                    {
                        for hit in more {
                            if !hits.iter().any(|h| h.url == hit.url) {
                                hits.push(hit);
                            }
                        }
                    }
                }
            }
        }

        let filter = &self.config.metadata_filter;
        let used = session.used_images();
        let best = if self.config.rank_by_metadata {
            rank_and_filter(&hits, used, filter)
        } else {
            first_eligible(&hits, used, filter)
        };

        if best.is_none() {
            tracing::debug!(
                "No eligible hit among {} results for '{}' ({})",
                hits.len(),
                candidate,
                provider.name()
            );
        }
        best
    }

    /// One provider call; abandoned as soon as the run is aborted
    async fn search_logged(
        &self,
        provider: &dyn ImageProvider,
        candidate: &str,
        params: &SearchParams,
        session: &mut FetchSession,
    ) -> Option<Vec<ImageHit>> {
        session.stats.provider_calls += 1;
        let abort = session.abort_signal().clone();

        let outcome = tokio::select! {
            biased;
            _ = abort.aborted() => {
                tracing::debug!("Aborted during {} search for '{}'", provider.name(), candidate);
                return None;
            }
            outcome = provider.search(candidate, params) => outcome,
        };

        match outcome {
            Ok(hits) => Some(hits),
            Err(e) if e.is_transient() => {
                session.stats.provider_errors += 1;
                tracing::warn!(
                    "{} search for '{}' failed: {}; moving to next candidate",
                    provider.name(),
                    candidate,
                    e
                );
                None
            }
            Err(e) => {
                session.stats.provider_errors += 1;
                tracing::error!("{} search for '{}' failed: {}", provider.name(), candidate, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::MetadataFilter;
    use crate::session::AbortSignal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn hit(url: &str, likes: u64) -> ImageHit {
        ImageHit {
            url: url.to_string(),
            credit: format!("Image by {} from Pixabay", url),
            likes,
            downloads: 0,
            views: 0,
            comments: 0,
        }
    }

    /// Returns `curated` hits for curated searches and `hits` otherwise
    struct StubProvider {
        name: &'static str,
        hits: Vec<ImageHit>,
        curated: Vec<ImageHit>,
        fail: bool,
        calls: AtomicUsize,
        queries: Mutex<Vec<(String, bool)>>,
    }

    impl StubProvider {
        fn new(name: &'static str, hits: Vec<ImageHit>) -> Self {
            Self {
                name,
                hits,
                curated: Vec::new(),
                fail: false,
                calls: AtomicUsize::new(0),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                fail: true,
                ..Self::new(name, Vec::new())
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ImageProvider for StubProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn search(&self, query: &str, params: &SearchParams) -> Result<Vec<ImageHit>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries
                .lock()
                .unwrap()
                .push((query.to_string(), params.curated));
            if self.fail {
                return Err(VocadeckError::RateLimited {
                    provider: self.name.to_string(),
                    attempts: 3,
                });
            }
            if params.curated {
                Ok(self.curated.clone())
            } else {
                Ok(self.hits.clone())
            }
        }
    }

    fn fetcher(providers: Vec<Arc<StubProvider>>, config: FetchConfig) -> ImageFetcher {
        let mut chain = ProviderChain::new();
        for p in providers {
            chain.push(p);
        }
        ImageFetcher::new(chain, ImageCache::open_in_memory().unwrap(), config)
    }

    #[tokio::test]
    async fn test_returns_best_hit_and_caches_it() {
        let provider = Arc::new(StubProvider::new("stub", vec![hit("low", 1), hit("high", 9)]));
        let fetcher = fetcher(vec![provider.clone()], FetchConfig::default());
        let mut session = FetchSession::new();

        let result = fetcher
            .fetch_image("A red fruit!", &SynonymDictionary::new(), &mut session)
            .await;
        assert_eq!(result.image_url.as_deref(), Some("high"));
        assert_eq!(result.credit.as_deref(), Some("Image by high from Pixabay"));
        assert!(session.is_used("high"));
        assert_eq!(fetcher.with_cache(|c| c.len()).unwrap(), 1);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_provider() {
        let provider = Arc::new(StubProvider::new("stub", vec![hit("only", 1)]));
        let fetcher = fetcher(vec![provider.clone()], FetchConfig::default());

        let mut first = FetchSession::new();
        fetcher
            .fetch_image("apple", &SynonymDictionary::new(), &mut first)
            .await;

        let mut second = FetchSession::new();
        let result = fetcher
            .fetch_image("apple", &SynonymDictionary::new(), &mut second)
            .await;
        assert_eq!(result.image_url.as_deref(), Some("only"));
        assert_eq!(second.stats.cache_hits, 1);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_used_cached_image_goes_back_to_provider() {
        let provider = Arc::new(StubProvider::new("stub", vec![hit("a", 5), hit("b", 1)]));
        let fetcher = fetcher(vec![provider.clone()], FetchConfig::default());
        let mut session = FetchSession::new();

        let first = fetcher
            .fetch_image("apple", &SynonymDictionary::new(), &mut session)
            .await;
        let second = fetcher
            .fetch_image("apple", &SynonymDictionary::new(), &mut session)
            .await;
        assert_eq!(first.image_url.as_deref(), Some("a"));
        assert_eq!(second.image_url.as_deref(), Some("b"));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_query_skips_lookup() {
        let provider = Arc::new(StubProvider::new("stub", vec![hit("a", 1)]));
        let fetcher = fetcher(vec![provider.clone()], FetchConfig::default());
        let mut session = FetchSession::new();

        let result = fetcher
            .fetch_image(" ?! ", &SynonymDictionary::new(), &mut session)
            .await;
        assert_eq!(result, FetchResult::none());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_synonym_candidates_tried_in_order() {
        let provider = Arc::new(StubProvider::new("stub", vec![hit("a", 1)]));
        let config = FetchConfig {
            metadata_filter: MetadataFilter {
                min_likes: 5,
                ..Default::default()
            },
            ..Default::default()
        };
        let fetcher = fetcher(vec![provider.clone()], config);
        let mut synonyms = SynonymDictionary::new();
        synonyms.insert("dog".to_string(), vec!["hound".to_string()]);
        let mut session = FetchSession::new();

        let result = fetcher.fetch_image("dog", &synonyms, &mut session).await;
        assert!(!result.is_found());
        let queries: Vec<String> = provider
            .queries
            .lock()
            .unwrap()
            .iter()
            .map(|(q, _)| q.clone())
            .collect();
        assert_eq!(queries, vec!["dog", "hound"]);
    }

    #[tokio::test]
    async fn test_strict_search_relaxed_once() {
        let mut stub = StubProvider::new("stub", vec![hit("plain", 3)]);
        stub.curated = vec![hit("curated", 1)];
        let provider = Arc::new(stub);
        let config = FetchConfig {
            strict_filters: true,
            ..Default::default()
        };
        let fetcher = fetcher(vec![provider.clone()], config);
        let mut session = FetchSession::new();

        let result = fetcher
            .fetch_image("apple", &SynonymDictionary::new(), &mut session)
            .await;
        assert_eq!(result.image_url.as_deref(), Some("plain"));
        assert_eq!(session.stats.relaxed_searches, 1);
        let queries = provider.queries.lock().unwrap().clone();
        assert_eq!(
            queries,
            vec![("apple".to_string(), true), ("apple".to_string(), false)]
        );
    }

    #[tokio::test]
    async fn test_falls_back_to_second_provider() {
        let primary = Arc::new(StubProvider::failing("primary"));
        let secondary = Arc::new(StubProvider::new("secondary", vec![hit("backup", 0)]));
        let fetcher = fetcher(
            vec![primary.clone(), secondary.clone()],
            FetchConfig::default(),
        );
        let mut session = FetchSession::new();

        let result = fetcher
            .fetch_image("apple", &SynonymDictionary::new(), &mut session)
            .await;
        assert_eq!(result.image_url.as_deref(), Some("backup"));
        assert_eq!(session.stats.fallbacks, 1);
        assert_eq!(session.stats.provider_errors, 1);
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn test_abort_stops_provider_calls() {
        let provider = Arc::new(StubProvider::new("stub", vec![hit("a", 1)]));
        let fetcher = fetcher(vec![provider.clone()], FetchConfig::default());
        let abort = AbortSignal::new();
        abort.abort();
        let mut session = FetchSession::with_abort(abort);

        let result = fetcher
            .fetch_image("apple", &SynonymDictionary::new(), &mut session)
            .await;
        assert!(!result.is_found());
        assert_eq!(provider.calls(), 0);
    }

    /// Never answers, like a provider sleeping out a long Retry-After
    struct StalledProvider;

    #[async_trait::async_trait]
    impl ImageProvider for StalledProvider {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn search(&self, _query: &str, _params: &SearchParams) -> Result<Vec<ImageHit>> {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok(vec![hit("late", 1)])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_interrupts_pending_search() {
        let mut chain = ProviderChain::new();
        chain.push(Arc::new(StalledProvider));
        let fetcher = ImageFetcher::new(
            chain,
            ImageCache::open_in_memory().unwrap(),
            FetchConfig::default(),
        );
        let abort = AbortSignal::new();
        let mut session = FetchSession::with_abort(abort.clone());

        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            abort.abort();
        });

        let started = tokio::time::Instant::now();
        let result = fetcher
            .fetch_image("apple", &SynonymDictionary::new(), &mut session)
            .await;

        assert!(!result.is_found());
        assert!(started.elapsed() < std::time::Duration::from_secs(60));
        assert_eq!(session.stats.provider_calls, 1);
        assert_eq!(session.stats.provider_errors, 0);
    }

    #[tokio::test]
    async fn test_unranked_takes_provider_order() {
        let provider = Arc::new(StubProvider::new("stub", vec![hit("first", 1), hit("best", 9)]));
        let config = FetchConfig {
            rank_by_metadata: false,
            ..Default::default()
        };
        let fetcher = fetcher(vec![provider], config);
        let mut session = FetchSession::new();

        let result = fetcher
            .fetch_image("apple", &SynonymDictionary::new(), &mut session)
            .await;
        assert_eq!(result.image_url.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_cache_size_limit_enforced() {
        let provider = Arc::new(StubProvider::new("stub", vec![hit("a", 1), hit("b", 1)]));
        let config = FetchConfig {
            cache_max_size: 1,
            ..Default::default()
        };
        let fetcher = fetcher(vec![provider], config);
        let mut session = FetchSession::new();

        fetcher
            .fetch_image("apple", &SynonymDictionary::new(), &mut session)
            .await;
        fetcher
            .fetch_image("pear", &SynonymDictionary::new(), &mut session)
            .await;
        assert_eq!(fetcher.with_cache(|c| c.len()).unwrap(), 1);
    }
}
