//! Multi-strategy execution of discovery queries.
//!
//! Each query is tried against the configured strategies in order until
//! one yields at least one publication number. Failures are downgraded to
//! log entries and counters so a bad query never aborts discovery.

use crate::error::Result;
use crate::extract::{extract_wo_from_value, extract_wo_numbers, wo_from_publication_number};
use crate::plan::SearchQuery;
use crate::provider::SearchProvider;
use patfinder_core::{DiscoveryConfig, RetryPolicy, StatsCollector, StrategyKind, WoNumber};
use std::collections::HashSet;
use std::sync::Arc;

/// Runs discovery queries through the configured strategy chain.
pub struct DiscoveryExecutor {
    provider: Arc<dyn SearchProvider>,
    retry: RetryPolicy,
    strategy_order: Vec<StrategyKind>,
}

impl DiscoveryExecutor {
    /// Create an executor over a search provider.
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        retry: RetryPolicy,
        config: &DiscoveryConfig,
    ) -> Self {
        Self {
            provider,
            retry,
            strategy_order: config.strategy_order.clone(),
        }
    }

    /// Run one query through the strategy chain.
    ///
    /// Strategies run in configured order until one returns at least one
    /// publication number. The winning strategy is tallied in the stats;
    /// every strategy invoked after the first counts as a fallback. An
    /// empty result is a normal outcome, and strategy errors are recorded
    /// rather than propagated.
    pub async fn run_query(&self, query: &SearchQuery, stats: &StatsCollector) -> Vec<WoNumber> {
        for (index, strategy) in self.strategy_order.iter().enumerate() {
            if index > 0 {
                stats.record_strategy_fallback();
            }

            let outcome = match strategy {
                StrategyKind::Provider => self.provider_strategy(&query.text, stats).await,
                StrategyKind::DirectFetch => self.direct_fetch_strategy(&query.text, stats).await,
            };

            match outcome {
                Ok(found) if !found.is_empty() => {
                    stats.record_strategy_use(strategy.id());
                    tracing::info!(
                        "Query '{}' yielded {} publication numbers via {}",
                        query.text,
                        found.len(),
                        strategy.id()
                    );
                    return found;
                }
                Ok(_) => {
                    tracing::debug!("Query '{}' yielded nothing via {}", query.text, strategy.id());
                }
                Err(e) => {
                    tracing::warn!("Strategy {} failed for '{}': {}", strategy.id(), query.text, e);
                    stats.record_error("wo_discovery");
                }
            }
        }

        Vec::new()
    }

    /// One-shot structured pass against the patent search engine using the
    /// bare molecule name. Harvests publication-number fields as well as
    /// titles and snippets of the organic results.
    pub async fn patent_engine_pass(
        &self,
        molecule: &str,
        stats: &StatsCollector,
    ) -> Vec<WoNumber> {
        let outcome = self
            .retry
            .run("patent_search", stats, || {
                self.provider.patent_search(molecule, stats)
            })
            .await;

        match outcome {
            Ok(payload) => {
                let found = harvest_patent_results(&payload);
                if found.is_empty() {
                    tracing::debug!("Patent engine pass yielded nothing for '{molecule}'");
                } else {
                    stats.record_strategy_use("patent_engine");
                    tracing::info!(
                        "Patent engine pass yielded {} publication numbers for '{molecule}'",
                        found.len()
                    );
                }
                found
            }
            Err(e) => {
                tracing::warn!("Patent engine pass failed for '{molecule}': {e}");
                stats.record_error("wo_discovery");
                Vec::new()
            }
        }
    }

    async fn provider_strategy(&self, text: &str, stats: &StatsCollector) -> Result<Vec<WoNumber>> {
        let payload = self
            .retry
            .run("keyword_search", stats, || {
                self.provider.keyword_search(text, stats)
            })
            .await?;
        Ok(extract_wo_from_value(&payload))
    }

    async fn direct_fetch_strategy(
        &self,
        text: &str,
        stats: &StatsCollector,
    ) -> Result<Vec<WoNumber>> {
        let body = self
            .retry
            .run("web_search", stats, || self.provider.web_search(text, stats))
            .await?;
        Ok(extract_wo_numbers(&body))
    }
}

/// Pull publication numbers out of a structured patent-search response:
/// the `publication_number` field of each organic result plus anything
/// embedded in its title or snippet.
fn harvest_patent_results(payload: &serde_json::Value) -> Vec<WoNumber> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    let mut push = |wo: WoNumber| {
        if seen.insert(wo.clone()) {
            found.push(wo);
        }
    };

    let results = payload
        .get("organic_results")
        .and_then(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();

    for result in results {
        if let Some(publication) = result.get("publication_number").and_then(|v| v.as_str()) {
            if let Some(wo) = wo_from_publication_number(publication) {
                push(wo);
            }
        }

        let title = result.get("title").and_then(|v| v.as_str()).unwrap_or_default();
        let snippet = result.get("snippet").and_then(|v| v.as_str()).unwrap_or_default();
        for wo in extract_wo_numbers(&format!("{title} {snippet}")) {
            push(wo);
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;
    use crate::plan::QueryOrigin;
    use async_trait::async_trait;
    use patfinder_core::RetryConfig;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Canned provider: each method pops its next scripted response.
    #[derive(Default)]
    struct MockProvider {
        keyword: Mutex<VecDeque<Result<Value>>>,
        web: Mutex<VecDeque<Result<String>>>,
        patent: Mutex<VecDeque<Result<Value>>>,
        keyword_calls: AtomicUsize,
        web_calls: AtomicUsize,
    }

    impl MockProvider {
        fn with_keyword(responses: Vec<Result<Value>>) -> Self {
            Self {
                keyword: Mutex::new(responses.into()),
                ..Self::default()
            }
        }

        fn with_keyword_and_web(
            keyword: Vec<Result<Value>>,
            web: Vec<Result<String>>,
        ) -> Self {
            Self {
                keyword: Mutex::new(keyword.into()),
                web: Mutex::new(web.into()),
                ..Self::default()
            }
        }

        fn pop<T>(queue: &Mutex<VecDeque<Result<T>>>) -> Result<T> {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(SearchError::Internal("mock exhausted".to_string())))
        }
    }

    #[async_trait]
    impl SearchProvider for MockProvider {
        async fn keyword_search(&self, _query: &str, _stats: &StatsCollector) -> Result<Value> {
            self.keyword_calls.fetch_add(1, Ordering::SeqCst);
            Self::pop(&self.keyword)
        }

        async fn patent_search(&self, _query: &str, _stats: &StatsCollector) -> Result<Value> {
            Self::pop(&self.patent)
        }

        async fn patent_details(&self, _patent_id: &str, _stats: &StatsCollector) -> Result<Value> {
            Err(SearchError::Internal("not scripted".to_string()))
        }

        async fn fetch_json(
            &self,
            _url: &str,
            _long_timeout: bool,
            _stats: &StatsCollector,
        ) -> Result<Value> {
            Err(SearchError::Internal("not scripted".to_string()))
        }

        async fn web_search(&self, _query: &str, _stats: &StatsCollector) -> Result<String> {
            self.web_calls.fetch_add(1, Ordering::SeqCst);
            Self::pop(&self.web)
        }

        fn append_credential(&self, url: &str) -> String {
            format!("{url}&api_key=test")
        }

        fn provider_id(&self) -> &str {
            "mock"
        }
    }

    fn executor(provider: MockProvider) -> DiscoveryExecutor {
        // Single attempt keeps tests free of backoff sleeps.
        let retry = RetryPolicy::new(&RetryConfig {
            max_attempts: 1,
            ..RetryConfig::default()
        });
        DiscoveryExecutor::new(Arc::new(provider), retry, &DiscoveryConfig::default())
    }

    fn query(text: &str) -> SearchQuery {
        SearchQuery {
            text: text.to_string(),
            origin: QueryOrigin::YearBanded,
        }
    }

    fn as_strings(found: &[WoNumber]) -> Vec<&str> {
        found.iter().map(WoNumber::as_str).collect()
    }

    #[tokio::test]
    async fn test_primary_strategy_wins() {
        let provider = MockProvider::with_keyword(vec![Ok(json!({
            "organic_results": [{"snippet": "see WO2020123456"}]
        }))]);
        let exec = executor(provider);
        let stats = StatsCollector::new();

        let found = exec.run_query(&query("darolutamide patent WO2020"), &stats).await;

        assert_eq!(as_strings(&found), vec!["WO2020123456"]);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.strategies_used.get("provider"), Some(&1));
        assert_eq!(snapshot.strategy_fallbacks, 0);
    }

    #[tokio::test]
    async fn test_fallback_after_empty_primary() {
        let provider = MockProvider::with_keyword_and_web(
            vec![Ok(json!({"organic_results": []}))],
            vec![Ok("results mention WO2019555444 twice: WO2019555444".to_string())],
        );
        let exec = executor(provider);
        let stats = StatsCollector::new();

        let found = exec.run_query(&query("q"), &stats).await;

        assert_eq!(as_strings(&found), vec!["WO2019555444"]);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.strategies_used.get("provider"), None);
        assert_eq!(snapshot.strategies_used.get("direct_fetch"), Some(&1));
        assert_eq!(snapshot.strategy_fallbacks, 1);
    }

    #[tokio::test]
    async fn test_fallback_after_primary_error() {
        let provider = MockProvider::with_keyword_and_web(
            vec![Err(SearchError::Internal("boom".to_string()))],
            vec![Ok("WO2021000111".to_string())],
        );
        let exec = executor(provider);
        let stats = StatsCollector::new();

        let found = exec.run_query(&query("q"), &stats).await;

        assert_eq!(as_strings(&found), vec!["WO2021000111"]);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.errors_by_source.get("wo_discovery"), Some(&1));
        assert_eq!(snapshot.strategy_fallbacks, 1);
    }

    #[tokio::test]
    async fn test_all_strategies_empty_is_not_an_error() {
        let provider = MockProvider::with_keyword_and_web(
            vec![Ok(json!({"organic_results": []}))],
            vec![Ok("no identifiers here".to_string())],
        );
        let exec = executor(provider);
        let stats = StatsCollector::new();

        let found = exec.run_query(&query("q"), &stats).await;

        assert!(found.is_empty());
        let snapshot = stats.snapshot();
        assert!(snapshot.strategies_used.is_empty());
        assert_eq!(snapshot.strategy_fallbacks, 1);
        assert_eq!(snapshot.total_errors, 0);
    }

    #[tokio::test]
    async fn test_strategy_order_is_respected() {
        let provider = MockProvider::with_keyword_and_web(
            vec![Ok(json!({"snippet": "WO2020123456"}))],
            vec![Ok("WO2019555444".to_string())],
        );
        let retry = RetryPolicy::new(&RetryConfig {
            max_attempts: 1,
            ..RetryConfig::default()
        });
        let config = DiscoveryConfig {
            strategy_order: vec![StrategyKind::DirectFetch],
            ..DiscoveryConfig::default()
        };
        let provider = Arc::new(provider);
        let exec = DiscoveryExecutor::new(provider.clone(), retry, &config);
        let stats = StatsCollector::new();

        let found = exec.run_query(&query("q"), &stats).await;

        assert_eq!(as_strings(&found), vec!["WO2019555444"]);
        assert_eq!(provider.keyword_calls.load(Ordering::SeqCst), 0);
        assert_eq!(provider.web_calls.load(Ordering::SeqCst), 1);
        assert_eq!(stats.snapshot().strategy_fallbacks, 0);
    }

    #[tokio::test]
    async fn test_patent_engine_pass_harvests_structured_fields() {
        let provider = MockProvider {
            patent: Mutex::new(
                vec![Ok(json!({
                    "organic_results": [
                        {
                            "publication_number": "WO2011051540A1",
                            "title": "Androgen receptor modulating compounds",
                            "snippet": "also published as WO2011051540"
                        },
                        {
                            "title": "Process variant",
                            "snippet": "see WO2018193946 for the parent filing"
                        }
                    ]
                }))]
                .into(),
            ),
            ..MockProvider::default()
        };
        let exec = executor(provider);
        let stats = StatsCollector::new();

        let found = exec.patent_engine_pass("darolutamide", &stats).await;

        assert_eq!(as_strings(&found), vec!["WO2011051540", "WO2018193946"]);
        assert_eq!(stats.snapshot().strategies_used.get("patent_engine"), Some(&1));
    }

    #[tokio::test]
    async fn test_patent_engine_pass_tolerates_errors() {
        let exec = executor(MockProvider::default());
        let stats = StatsCollector::new();

        let found = exec.patent_engine_pass("darolutamide", &stats).await;

        assert!(found.is_empty());
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.errors_by_source.get("wo_discovery"), Some(&1));
        assert!(snapshot.strategies_used.is_empty());
    }
}
