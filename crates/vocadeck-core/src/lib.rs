//! Vocadeck Core Library
//!
//! Turns vocabulary tables into illustrated flashcards.
//!
//! # Features
//! - Markdown pipe-table and CSV input parsing
//! - Query normalization, synonym expansion and optional lemmatization
//! - Pixabay and Pexels image search with rate-limit recovery and fallback
//! - Popularity ranking with metadata thresholds and per-run deduplication
//! - SQLite-backed result cache with 24h expiry and size-bounded eviction

pub mod cache;
pub mod config;
pub mod convert;
pub mod deck;
pub mod error;
pub mod fetch;
pub mod input;
pub mod providers;
pub mod query;
pub mod rank;
pub mod session;
pub mod synonyms;

pub use cache::{CacheEntry, CacheStats, ImageCache};
pub use config::{Config, FetchConfig, ProviderSettings, SynonymConfig};
pub use convert::{convert_key_value_text, fix_table_text, write_standard_csv};
pub use deck::{
    back_text, front_text, sanitize_deck_name, write_deck_csv, Card, DeckBuilder, RunSummary,
};
pub use error::{Error, Result, VocadeckError};
pub use fetch::{FetchResult, ImageFetcher};
pub use input::{
    detect_format, parse_csv, parse_input, parse_markdown_table, validate_markdown_table,
    InputFormat, Row,
};
pub use providers::{
    ImageHit, ImageProvider, Orientation, PexelsProvider, PixabayProvider, ProviderChain,
    SearchParams,
};
pub use query::{candidate_queries, expand, normalize_query, refine};
pub use rank::{rank_and_filter, MetadataFilter};
pub use session::{AbortSignal, FetchSession, FetchStats};
pub use synonyms::{DatamuseLookup, SynonymDictionary, SynonymLookup, SynonymStore};

/// Default cache directory name
pub const CACHE_DIR_NAME: &str = "vocadeck";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "vocadeck";

/// User-Agent sent with every outgoing request
pub const USER_AGENT: &str = concat!("vocadeck/", env!("CARGO_PKG_VERSION"));
