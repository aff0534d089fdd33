//! Configuration management

use crate::error::{Result, VocadeckError};
use crate::rank::MetadataFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Primary image provider
    #[serde(default)]
    pub pixabay: ProviderSettings,

    /// Fallback image provider
    #[serde(default)]
    pub pexels: ProviderSettings,

    /// Image lookup toggles
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Synonym dictionary and online lookup
    #[serde(default)]
    pub synonyms: SynonymConfig,

    /// Location of the image result cache
    #[serde(default)]
    pub cache_path: Option<PathBuf>,

    /// Flat key kept for config files written by older releases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixabay_api_key: Option<String>,

    /// Flat key kept for config files written by older releases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pexels_api_key: Option<String>,
}

/// Connection settings for one image search backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// API key; `None` disables the provider
    #[serde(default)]
    pub api_key: Option<String>,

    /// Override for the API endpoint (the provider default is used otherwise)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Results requested per search
    #[serde(default)]
    pub per_page: Option<u32>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Retries of the same query after HTTP 429
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Wait used when a 429 response carries no usable Retry-After header
    #[serde(default = "default_retry_after")]
    pub default_retry_after_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            per_page: None,
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            default_retry_after_secs: default_retry_after(),
        }
    }
}

fn default_timeout() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_after() -> u64 {
    60
}

/// Toggles for the image lookup pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Expand queries with synonyms
    #[serde(default = "default_true")]
    pub use_synonyms: bool,

    /// Sort hits by likes, downloads, views before picking one
    #[serde(default = "default_true")]
    pub rank_by_metadata: bool,

    /// Start with curated-only searches, relaxing when results are sparse
    #[serde(default)]
    pub strict_filters: bool,

    /// Lemmatize and drop stop words from every candidate query
    #[serde(default)]
    pub apply_nlp: bool,

    /// Extra terms appended to every search
    #[serde(default)]
    pub tags: Vec<String>,

    /// Minimum popularity a hit needs to be eligible
    #[serde(default)]
    pub metadata_filter: MetadataFilter,

    /// Maximum number of cached results kept on disk
    #[serde(default = "default_cache_max_size")]
    pub cache_max_size: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            use_synonyms: true,
            rank_by_metadata: true,
            strict_filters: false,
            apply_nlp: false,
            tags: Vec::new(),
            metadata_filter: MetadataFilter::default(),
            cache_max_size: default_cache_max_size(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_cache_max_size() -> usize {
    1000
}

/// Synonym dictionary configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynonymConfig {
    /// JSON dictionary file, word -> synonyms
    #[serde(default = "default_synonyms_path")]
    pub path: PathBuf,

    /// Query the online thesaurus for words missing from the dictionary
    #[serde(default = "default_true")]
    pub online: bool,

    /// Base URL of the Datamuse-compatible lookup service
    #[serde(default = "default_lookup_url")]
    pub lookup_url: String,

    /// Synonyms requested per word
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for SynonymConfig {
    fn default() -> Self {
        Self {
            path: default_synonyms_path(),
            online: true,
            lookup_url: default_lookup_url(),
            max_results: default_max_results(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_synonyms_path() -> PathBuf {
    PathBuf::from("synonyms.json")
}

fn default_lookup_url() -> String {
    "https://api.datamuse.com".to_string()
}

fn default_max_results() -> usize {
    5
}

impl Config {
    /// Load config from an explicit path, `VOCADECK_CONFIG`, or the default path
    ///
    /// A missing file yields the defaults; environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("VOCADECK_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(Self::default_path);

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Self::parse(&content)?
        } else {
            tracing::debug!("No config file at {:?}, using defaults", path);
            Config::default()
        };

        config.apply_env();
        Ok(config)
    }

    /// Parse config text (YAML or JSON)
    pub fn parse(content: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;
        match value {
            serde_yaml::Value::Null => Ok(Config::default()),
            serde_yaml::Value::Mapping(_) => Ok(serde_yaml::from_value(value)?),
            other => Err(VocadeckError::Config(format!(
                "Invalid config type: expected mapping, got {}",
                yaml_type_name(&other)
            ))),
        }
    }

    /// Save config to a path
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Cache location, falling back to the user cache directory
    pub fn cache_path(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(crate::CACHE_DIR_NAME)
                .join("images.sqlite")
        })
    }

    /// Pixabay key; the primary provider is mandatory
    pub fn pixabay_api_key(&self) -> Result<&str> {
        self.pixabay
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                VocadeckError::Config(
                    "Pixabay API key is missing. Set PIXABAY_API_KEY or pixabay.api_key in the config file"
                        .to_string(),
                )
            })
    }

    /// Pexels key, if the fallback provider is configured
    pub fn pexels_api_key(&self) -> Option<&str> {
        self.pexels
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
    }

    fn apply_env(&mut self) {
        if self.pixabay.api_key.is_none() {
            self.pixabay.api_key = self.pixabay_api_key.take();
        }
        if self.pexels.api_key.is_none() {
            self.pexels.api_key = self.pexels_api_key.take();
        }
        if let Ok(key) = std::env::var("PIXABAY_API_KEY") {
            self.pixabay.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("PEXELS_API_KEY") {
            self.pexels.api_key = Some(key);
        }
        if let Ok(path) = std::env::var("VOCADECK_CACHE") {
            self.cache_path = Some(PathBuf::from(path));
        }
    }
}

fn yaml_type_name(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "bool",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "list",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged value",
    }
}
