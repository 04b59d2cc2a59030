//! Patfinder Core - Foundation crate for the Patfinder patent pipeline.
//!
//! This crate provides shared types, error handling, configuration
//! management, and the cross-cutting utilities (TTL caching, retry policy,
//! run statistics) that all other Patfinder crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes (`WoNumber`, `CountryCode`)
//! - [`cache`] - In-memory TTL cache for tokens and results
//! - [`retry`] - Exponential backoff policy for upstream calls
//! - [`stats`] - Per-run statistics collection
//!
//! # Example
//!
//! ```rust
//! use patfinder_core::{AppConfig, WoNumber};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration
//! let config = AppConfig::default();
//! assert_eq!(config.navigation.target_jurisdiction, "BR");
//!
//! // Publication numbers are validated and normalized on construction
//! let wo = WoNumber::new("wo2020123456")?;
//! assert_eq!(wo.as_str(), "WO2020123456");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cache;
pub mod config;
pub mod error;
pub mod retry;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use cache::TtlCache;
pub use config::{
    AppConfig, CacheConfig, ChemConfig, DiscoveryConfig, NavigationConfig, OfficeConfig,
    RegistryConfig, RetryConfig, SearchConfig, StrategyKind,
};
pub use error::{ConfigError, ConfigResult, PatfinderError, Result};
pub use retry::{RetryPolicy, Retryable};
pub use stats::{ExecutionStats, RequestLog, Stage, StatsCollector};
pub use types::{CountryCode, WoNumber};
