//! Run statistics collected across pipeline stages.
//!
//! A [`StatsCollector`] travels through the pipeline by shared reference
//! and is folded into an [`ExecutionStats`] snapshot attached to every
//! result, successful or not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// One upstream request recorded for diagnostics.
///
/// URLs are sanitized by the caller before logging; credentials never
/// reach this structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLog {
    /// Pipeline step that issued the request, e.g. `wo_search_WO2020123456`
    pub step: String,
    /// Request URL with credential parameters removed
    pub url: String,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    /// Response body size in bytes
    pub response_bytes: usize,
    /// Wall-clock duration of the request in milliseconds
    pub elapsed_ms: u64,
    /// Error message, when the request failed before yielding a response
    pub error: Option<String>,
}

/// Pipeline stages with attributed wall-clock timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Compound profile resolution
    Profile,
    /// Publication discovery
    Discovery,
    /// Family navigation and detail fetching
    Navigation,
    /// Patent office backup search
    Office,
    /// National registry deep search
    Registry,
}

/// Aggregated counters and timings for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStats {
    /// Unique identifier of the run
    pub run_id: Uuid,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished, if it has
    pub finished_at: Option<DateTime<Utc>>,
    /// Total run duration in seconds
    pub total_secs: f64,
    /// Time spent resolving the compound profile
    pub profile_secs: f64,
    /// Time spent discovering publications
    pub discovery_secs: f64,
    /// Time spent navigating families and fetching details
    pub navigation_secs: f64,
    /// Time spent in the patent office backup search
    pub office_secs: f64,
    /// Time spent querying the national registry
    pub registry_secs: f64,
    /// Discovery queries planned for the run
    pub queries_attempted: u64,
    /// Discovery queries that yielded at least one identifier
    pub queries_successful: u64,
    /// Unique publication identifiers discovered
    pub identifiers_found: u64,
    /// Successful uses per discovery strategy
    pub strategies_used: HashMap<String, u64>,
    /// How often a non-primary strategy had to be invoked
    pub strategy_fallbacks: u64,
    /// Families navigated
    pub families_processed: u64,
    /// Families that produced at least one target-jurisdiction detail
    pub families_with_filings: u64,
    /// Families skipped for lack of navigation data
    pub families_skipped: u64,
    /// Families that failed with an unexpected error
    pub families_errored: u64,
    /// Target-jurisdiction filing identifiers collected
    pub filings_found: u64,
    /// Bibliographic detail fetches that succeeded
    pub details_fetched: u64,
    /// Bibliographic detail fetches that failed
    pub details_failed: u64,
    /// Queries issued against the national registry
    pub registry_queries: u64,
    /// Unique registry records returned
    pub registry_results: u64,
    /// Failed attempts absorbed by the retry policy
    pub total_retries: u64,
    /// Errors recorded across all sources
    pub total_errors: u64,
    /// Error counts keyed by source name
    pub errors_by_source: HashMap<String, u64>,
    /// Individual upstream requests, in issue order
    pub requests: Vec<RequestLog>,
}

impl ExecutionStats {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            total_secs: 0.0,
            profile_secs: 0.0,
            discovery_secs: 0.0,
            navigation_secs: 0.0,
            office_secs: 0.0,
            registry_secs: 0.0,
            queries_attempted: 0,
            queries_successful: 0,
            identifiers_found: 0,
            strategies_used: HashMap::new(),
            strategy_fallbacks: 0,
            families_processed: 0,
            families_with_filings: 0,
            families_skipped: 0,
            families_errored: 0,
            filings_found: 0,
            details_fetched: 0,
            details_failed: 0,
            registry_queries: 0,
            registry_results: 0,
            total_retries: 0,
            total_errors: 0,
            errors_by_source: HashMap::new(),
            requests: Vec::new(),
        }
    }
}

/// Thread-safe accumulator for [`ExecutionStats`].
///
/// Stages receive a shared reference and record what they did; the
/// pipeline takes a snapshot at the end of the run.
#[derive(Debug)]
pub struct StatsCollector {
    inner: Mutex<ExecutionStats>,
}

impl StatsCollector {
    /// Start collecting for a new run.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ExecutionStats::new()),
        }
    }

    /// Attribute wall-clock time to a stage.
    pub fn record_stage(&self, stage: Stage, elapsed: Duration) {
        let mut stats = self.lock();
        let secs = elapsed.as_secs_f64();
        match stage {
            Stage::Profile => stats.profile_secs += secs,
            Stage::Discovery => stats.discovery_secs += secs,
            Stage::Navigation => stats.navigation_secs += secs,
            Stage::Office => stats.office_secs += secs,
            Stage::Registry => stats.registry_secs += secs,
        }
    }

    /// Record how many discovery queries the run planned.
    pub fn add_queries_attempted(&self, count: u64) {
        self.lock().queries_attempted += count;
    }

    /// Record a discovery query that yielded identifiers.
    pub fn record_query_success(&self) {
        self.lock().queries_successful += 1;
    }

    /// Record the number of unique identifiers the run discovered.
    pub fn set_identifiers_found(&self, count: u64) {
        self.lock().identifiers_found = count;
    }

    /// Tally a successful use of a discovery strategy.
    pub fn record_strategy_use(&self, strategy: &str) {
        *self
            .lock()
            .strategies_used
            .entry(strategy.to_string())
            .or_insert(0) += 1;
    }

    /// Tally an invocation of a non-primary strategy.
    pub fn record_strategy_fallback(&self) {
        self.lock().strategy_fallbacks += 1;
    }

    /// Record a family navigation being started.
    pub fn record_family_processed(&self) {
        self.lock().families_processed += 1;
    }

    /// Record a family that produced at least one detail.
    pub fn record_family_with_filings(&self) {
        self.lock().families_with_filings += 1;
    }

    /// Record a family skipped for lack of navigation data.
    pub fn record_family_skipped(&self) {
        self.lock().families_skipped += 1;
    }

    /// Record a family navigation that failed unexpectedly.
    pub fn record_family_error(&self) {
        self.lock().families_errored += 1;
    }

    /// Record target-jurisdiction filings collected from one family.
    pub fn add_filings_found(&self, count: u64) {
        self.lock().filings_found += count;
    }

    /// Record a successful bibliographic detail fetch.
    pub fn record_detail_fetched(&self) {
        self.lock().details_fetched += 1;
    }

    /// Record a failed bibliographic detail fetch.
    pub fn record_detail_failed(&self) {
        self.lock().details_failed += 1;
    }

    /// Record queries issued against the national registry.
    pub fn add_registry_queries(&self, count: u64) {
        self.lock().registry_queries += count;
    }

    /// Record unique registry records returned.
    pub fn add_registry_results(&self, count: u64) {
        self.lock().registry_results += count;
    }

    /// Record a failed attempt absorbed by the retry policy.
    pub fn record_retry(&self) {
        self.lock().total_retries += 1;
    }

    /// Record an error attributed to `source`.
    pub fn record_error(&self, source: &str) {
        let mut stats = self.lock();
        stats.total_errors += 1;
        *stats.errors_by_source.entry(source.to_string()).or_insert(0) += 1;
    }

    /// Append an upstream request record.
    pub fn record_request(&self, request: RequestLog) {
        self.lock().requests.push(request);
    }

    /// Mark the run finished and set the total duration.
    pub fn finish(&self) {
        let mut stats = self.lock();
        let now = Utc::now();
        stats.total_secs = (now - stats.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
            .as_secs_f64();
        stats.finished_at = Some(now);
    }

    /// Clone the current state.
    #[must_use]
    pub fn snapshot(&self) -> ExecutionStats {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ExecutionStats> {
        self.inner.lock().expect("acquire stats lock")
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}
