//! Configuration management for Patfinder.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. Credentials are never written to the
//! config file; they are injected from the environment at load time.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main application configuration.
///
/// This is loaded from `~/.config/patfinder/config.toml` (or platform
/// equivalent). If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Search provider settings
    pub search: SearchConfig,
    /// Publication discovery settings
    pub discovery: DiscoveryConfig,
    /// Compound lookup settings
    pub chem: ChemConfig,
    /// Family navigation settings
    pub navigation: NavigationConfig,
    /// Patent office backup settings
    pub office: OfficeConfig,
    /// National registry settings
    pub registry: RegistryConfig,
    /// Retry behavior settings
    pub retry: RetryConfig,
    /// Result cache settings
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `PATFINDER_SERPAPI_KEY`: search provider API key
    /// - `PATFINDER_OFFICE_KEY`: patent office consumer key
    /// - `PATFINDER_OFFICE_SECRET`: patent office consumer secret
    /// - `PATFINDER_REGISTRY_URL`: national registry base URL
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;

        // Override from environment
        if let Ok(val) = std::env::var("PATFINDER_SERPAPI_KEY") {
            config.search.api_key = Some(val);
            tracing::debug!("Override search.api_key from env");
        }

        if let Ok(val) = std::env::var("PATFINDER_OFFICE_KEY") {
            config.office.consumer_key = Some(val);
            tracing::debug!("Override office.consumer_key from env");
        }

        if let Ok(val) = std::env::var("PATFINDER_OFFICE_SECRET") {
            config.office.consumer_secret = Some(val);
            tracing::debug!("Override office.consumer_secret from env");
        }

        if let Ok(val) = std::env::var("PATFINDER_REGISTRY_URL") {
            tracing::debug!("Override registry.base_url from env: {}", val);
            config.registry.base_url = Some(val);
        }

        Ok(config)
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist. Credential fields
    /// are skipped during serialization and never land on disk.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/patfinder/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("io", "patfinder", "patfinder").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Search provider (SerpApi-compatible) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Base URL of the JSON search endpoint
    pub base_url: String,
    /// API key, injected from `PATFINDER_SERPAPI_KEY`
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Timeout for standard provider requests, in seconds
    pub timeout_secs: u64,
    /// Timeout for heavyweight continuation fetches, in seconds
    pub long_timeout_secs: u64,
    /// URL used by the direct web-search fallback
    pub web_search_url: String,
    /// Timeout for direct web-search requests, in seconds
    pub web_timeout_secs: u64,
    /// User agent sent with direct web-search requests
    pub user_agent: String,
    /// Number of results requested per provider query
    pub result_count: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://serpapi.com/search.json".to_string(),
            api_key: None,
            timeout_secs: 60,
            long_timeout_secs: 120,
            web_search_url: "https://www.google.com/search".to_string(),
            web_timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"
                .to_string(),
            result_count: 20,
        }
    }
}

/// Settings controlling the publication discovery stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Publication years combined with the molecule name in banded queries
    pub years: Vec<u16>,
    /// Assignee names combined with the molecule name
    pub assignees: Vec<String>,
    /// How many development codes from the profile are queried
    pub max_dev_code_queries: usize,
    /// How many IUPAC names from the profile are queried
    pub max_iupac_queries: usize,
    /// Whether a registry-number query is issued when the profile has one
    pub include_cas_query: bool,
    /// Hard cap on the total number of discovery queries per run
    pub max_queries: usize,
    /// Pause between consecutive discovery queries, in milliseconds
    pub delay_between_queries_ms: u64,
    /// Strategies tried in order for each query until one yields results
    pub strategy_order: Vec<StrategyKind>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            years: vec![2011, 2016, 2018, 2019, 2020, 2021, 2022, 2023, 2024],
            assignees: vec![
                "Orion Corporation".to_string(),
                "Bayer".to_string(),
                "Takeda".to_string(),
                "Novartis".to_string(),
                "Pfizer".to_string(),
            ],
            max_dev_code_queries: 3,
            max_iupac_queries: 2,
            include_cas_query: true,
            max_queries: 30,
            delay_between_queries_ms: 800,
            strategy_order: vec![StrategyKind::Provider, StrategyKind::DirectFetch],
        }
    }
}

/// Discovery strategy identifiers, in the order they appear in
/// [`DiscoveryConfig::strategy_order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Query the structured search provider
    Provider,
    /// Fetch a web search results page directly and scan the raw body
    DirectFetch,
}

impl StrategyKind {
    /// Stable identifier used in per-strategy statistics.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::DirectFetch => "direct_fetch",
        }
    }
}

/// Compound lookup (PubChem-compatible) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChemConfig {
    /// Base URL of the compound synonym service
    pub base_url: String,
    /// Request timeout, in seconds
    pub timeout_secs: u64,
    /// Maximum development codes kept in a profile
    pub max_dev_codes: usize,
    /// Maximum IUPAC names kept in a profile
    pub max_iupac_names: usize,
    /// Maximum synonyms kept in a profile
    pub max_synonyms: usize,
    /// Synonyms longer than this are not kept in the synonym list
    pub max_synonym_length: usize,
}

impl Default for ChemConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pubchem.ncbi.nlm.nih.gov/rest/pug".to_string(),
            timeout_secs: 30,
            max_dev_codes: 15,
            max_iupac_names: 5,
            max_synonyms: 50,
            max_synonym_length: 50,
        }
    }
}

/// Settings controlling family navigation and detail fetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// How many discovered publications are navigated per run
    pub max_families: usize,
    /// Hard cap on bibliographic detail fetches per run
    pub max_details: usize,
    /// Pause between consecutive family navigations, in milliseconds
    pub delay_between_families_ms: u64,
    /// Pause between consecutive detail fetches, in milliseconds
    pub delay_between_details_ms: u64,
    /// Abstracts are truncated to this many characters
    pub abstract_max_len: usize,
    /// Jurisdiction whose filings are collected and detail-fetched
    pub target_jurisdiction: String,
    /// Minimum length of a normalized filing identifier
    pub min_filing_length: usize,
    /// Whether filings outside the target jurisdiction are kept on records
    pub keep_other_jurisdictions: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            max_families: 5,
            max_details: 20,
            delay_between_families_ms: 1500,
            delay_between_details_ms: 500,
            abstract_max_len: 300,
            target_jurisdiction: "BR".to_string(),
            min_filing_length: 12,
            keep_other_jurisdictions: true,
        }
    }
}

/// Patent office (OPS-compatible) backup search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OfficeConfig {
    /// Base URL of the patent office API
    pub base_url: String,
    /// OAuth consumer key, injected from `PATFINDER_OFFICE_KEY`
    #[serde(skip)]
    pub consumer_key: Option<String>,
    /// OAuth consumer secret, injected from `PATFINDER_OFFICE_SECRET`
    #[serde(skip)]
    pub consumer_secret: Option<String>,
    /// Access token lifetime, in seconds
    pub token_ttl_secs: u64,
    /// Backup search runs when fewer filings than this were found
    pub backup_threshold: usize,
    /// How many publications are searched during backup
    pub max_families: usize,
    /// Pause between consecutive office requests, in milliseconds
    pub delay_between_requests_ms: u64,
    /// Request timeout, in seconds
    pub timeout_secs: u64,
}

impl Default for OfficeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ops.epo.org/3.2".to_string(),
            consumer_key: None,
            consumer_secret: None,
            token_ttl_secs: 900,
            backup_threshold: 5,
            max_families: 5,
            delay_between_requests_ms: 500,
            timeout_secs: 60,
        }
    }
}

/// National registry deep-search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Base URL of the registry search endpoint; deep search is skipped
    /// when unset
    pub base_url: Option<String>,
    /// Request timeout, in seconds
    pub timeout_secs: u64,
    /// Pause between consecutive registry queries, in milliseconds
    pub delay_between_queries_ms: u64,
    /// Hard cap on registry queries per run
    pub max_queries: usize,
    /// How many development codes contribute query variants
    pub max_dev_codes: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 90,
            delay_between_queries_ms: 1500,
            max_queries: 20,
            max_dev_codes: 10,
        }
    }
}

/// Retry behavior for transient failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum attempts per operation (first try included)
    pub max_attempts: u32,
    /// Base of the exponential backoff, in seconds
    pub delay_base_secs: f64,
    /// Backoff multiplier applied when the failure was a rate limit
    pub rate_limit_multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_base_secs: 2.0,
            rate_limit_multiplier: 3,
        }
    }
}

/// Result cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long completed results are served from cache, in seconds.
    /// Zero effectively disables the cache.
    pub result_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            result_ttl_secs: 3600,
        }
    }
}
