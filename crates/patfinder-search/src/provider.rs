//! Search provider abstraction.
//!
//! Every upstream the discovery and navigation stages talk to is reached
//! through this trait, which keeps the pipeline testable and provider
//! churn contained to one module.

use crate::error::Result;
use async_trait::async_trait;
use patfinder_core::StatsCollector;
use serde_json::Value;

/// A structured web and patent search backend.
///
/// Methods take the run's [`StatsCollector`] so implementations can record
/// per-request diagnostics. Responses are returned as raw JSON; identifier
/// extraction happens downstream and never assumes a fixed shape.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Keyword search against the general web engine.
    async fn keyword_search(&self, query: &str, stats: &StatsCollector) -> Result<Value>;

    /// Search against the patent-specific engine.
    async fn patent_search(&self, query: &str, stats: &StatsCollector) -> Result<Value>;

    /// Bibliographic details for a single patent document.
    async fn patent_details(&self, patent_id: &str, stats: &StatsCollector) -> Result<Value>;

    /// Fetch an absolute provider URL, typically a continuation link taken
    /// from an earlier response. `long_timeout` selects the extended
    /// timeout used for heavyweight family responses.
    async fn fetch_json(
        &self,
        url: &str,
        long_timeout: bool,
        stats: &StatsCollector,
    ) -> Result<Value>;

    /// Plain web search returning the raw response body for text scanning.
    async fn web_search(&self, query: &str, stats: &StatsCollector) -> Result<String>;

    /// Append this provider's credential to a continuation URL.
    fn append_credential(&self, url: &str) -> String;

    /// Stable identifier used in logs and statistics.
    fn provider_id(&self) -> &str;
}
