//! Family navigation from an international publication to its national
//! filings.
//!
//! Navigation is a fixed multi-hop traversal mirroring how the patent
//! search provider links its resources together: a structured search for
//! the publication, a continuation endpoint from the response metadata,
//! and a family-detail resource listing worldwide applications. Each hop
//! can dead-end, and every dead end maps to an explicit record status so
//! a run always accounts for every publication it touched.

use crate::details::{DetailFetcher, FilingDetail};
use crate::error::{FamilyError, Result};
use patfinder_core::{CountryCode, NavigationConfig, StatsCollector, WoNumber};
use patfinder_search::SearchProvider;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Terminal status of one family navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilyStatus {
    /// At least one filing detail was obtained.
    Success,
    /// The publication search had no continuation endpoint.
    NoContinuation,
    /// The continuation fetch dead-ended before family data.
    NoFamilyData,
    /// The family holds no detailed target-jurisdiction filings.
    NoFilings,
    /// Navigation failed with an error.
    Error,
}

/// Outcome record for one processed publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyRecord {
    /// Publication this record belongs to.
    pub wo_number: WoNumber,
    /// How navigation ended.
    pub status: FamilyStatus,
    /// Title from the publication search, when present.
    pub title: String,
    /// Assignee from the publication search, when present.
    pub assignee: Option<String>,
    /// Filing identifiers bucketed by jurisdiction.
    pub filings: BTreeMap<CountryCode, Vec<String>>,
    /// Error message when `status` is `Error`.
    pub error: Option<String>,
}

/// A finalized family record together with the filing details fetched
/// for it.
#[derive(Debug, Clone)]
pub struct NavigationOutcome {
    /// The family record.
    pub record: FamilyRecord,
    /// Details for this family's target-jurisdiction filings.
    pub details: Vec<FilingDetail>,
}

enum Phase {
    DiscoverLink,
    FetchFamily { continuation: String },
    ExtractFilings { family_link: String },
}

/// Walks one publication through the navigation phases.
pub struct FamilyNavigator {
    provider: Arc<dyn SearchProvider>,
    config: NavigationConfig,
    target: CountryCode,
}

impl FamilyNavigator {
    /// Create a navigator for the configured target jurisdiction.
    pub fn new(provider: Arc<dyn SearchProvider>, config: &NavigationConfig) -> Result<Self> {
        let target = CountryCode::new(&config.target_jurisdiction)
            .map_err(|e| FamilyError::Internal(format!("invalid target jurisdiction: {e}")))?;

        Ok(Self {
            provider,
            config: config.clone(),
            target,
        })
    }

    /// Navigate one publication to its national filings.
    ///
    /// Never fails: any error is folded into a record with status
    /// `Error` so the caller can continue with the next publication.
    pub async fn process(
        &self,
        wo: &WoNumber,
        fetcher: &DetailFetcher,
        stats: &StatsCollector,
    ) -> NavigationOutcome {
        tracing::info!("Navigating family of {}", wo);
        stats.record_family_processed();

        match self.run_phases(wo, fetcher, stats).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Family navigation failed for {}: {}", wo, e);
                stats.record_family_error();
                stats.record_error("family_navigation");
                NavigationOutcome {
                    record: FamilyRecord {
                        wo_number: wo.clone(),
                        status: FamilyStatus::Error,
                        title: String::new(),
                        assignee: None,
                        filings: BTreeMap::new(),
                        error: Some(e.to_string()),
                    },
                    details: Vec::new(),
                }
            }
        }
    }

    async fn run_phases(
        &self,
        wo: &WoNumber,
        fetcher: &DetailFetcher,
        stats: &StatsCollector,
    ) -> Result<NavigationOutcome> {
        let mut title = String::new();
        let mut assignee = None;
        let mut phase = Phase::DiscoverLink;

        loop {
            phase = match phase {
                Phase::DiscoverLink => {
                    let payload = self.provider.patent_search(wo.as_str(), stats).await?;

                    if let Some(first) = first_organic_result(&payload) {
                        if let Some(t) = first.get("title").and_then(|v| v.as_str()) {
                            title = t.to_string();
                        }
                        assignee = first
                            .get("assignee")
                            .and_then(|v| v.as_str())
                            .map(ToString::to_string);
                    }

                    match payload
                        .get("search_metadata")
                        .and_then(|v| v.get("json_endpoint"))
                        .and_then(|v| v.as_str())
                    {
                        Some(endpoint) => Phase::FetchFamily {
                            continuation: endpoint.to_string(),
                        },
                        None => {
                            tracing::debug!("No continuation endpoint for {}", wo);
                            stats.record_family_skipped();
                            return Ok(self.terminal(
                                wo,
                                FamilyStatus::NoContinuation,
                                title,
                                assignee,
                                BTreeMap::new(),
                            ));
                        }
                    }
                }

                Phase::FetchFamily { continuation } => {
                    // The continuation fans out to a slower backing index,
                    // hence the long timeout. Its failure is a routine
                    // dead end, not a run error.
                    let family_link = match self.provider.fetch_json(&continuation, true, stats).await {
                        Ok(payload) => first_organic_result(&payload)
                            .and_then(|first| first.get("serpapi_link"))
                            .and_then(|v| v.as_str())
                            .map(ToString::to_string),
                        Err(e) => {
                            tracing::warn!("Continuation fetch failed for {}: {}", wo, e);
                            None
                        }
                    };

                    match family_link {
                        Some(family_link) => Phase::ExtractFilings { family_link },
                        None => {
                            tracing::debug!("No family data behind continuation for {}", wo);
                            stats.record_family_skipped();
                            return Ok(self.terminal(
                                wo,
                                FamilyStatus::NoFamilyData,
                                title,
                                assignee,
                                BTreeMap::new(),
                            ));
                        }
                    }
                }

                Phase::ExtractFilings { family_link } => {
                    let url = self.provider.append_credential(&family_link);
                    let payload = self.provider.fetch_json(&url, false, stats).await?;
                    let filings = self.bucket_filings(&payload);

                    let target_ids = filings.get(&self.target).cloned().unwrap_or_default();
                    if target_ids.is_empty() {
                        tracing::debug!("No {} filings in family of {}", self.target, wo);
                        return Ok(self.terminal(
                            wo,
                            FamilyStatus::NoFilings,
                            title,
                            assignee,
                            filings,
                        ));
                    }

                    tracing::info!(
                        "Family of {} holds {} {} filings",
                        wo,
                        target_ids.len(),
                        self.target
                    );
                    stats.add_filings_found(target_ids.len() as u64);
                    stats.record_family_with_filings();

                    let details = fetcher.fetch_all(&target_ids, Some(wo), stats).await;
                    let status = if details.is_empty() {
                        FamilyStatus::NoFilings
                    } else {
                        FamilyStatus::Success
                    };

                    return Ok(NavigationOutcome {
                        record: FamilyRecord {
                            wo_number: wo.clone(),
                            status,
                            title,
                            assignee,
                            filings,
                            error: None,
                        },
                        details,
                    });
                }
            };
        }
    }

    fn terminal(
        &self,
        wo: &WoNumber,
        status: FamilyStatus,
        title: String,
        assignee: Option<String>,
        filings: BTreeMap<CountryCode, Vec<String>>,
    ) -> NavigationOutcome {
        NavigationOutcome {
            record: FamilyRecord {
                wo_number: wo.clone(),
                status,
                title,
                assignee,
                filings,
                error: None,
            },
            details: Vec::new(),
        }
    }

    /// Bucket the worldwide applications of a family-detail payload by
    /// jurisdiction prefix. The root publication entries and ids without
    /// a parseable prefix are skipped; non-target buckets are kept only
    /// when configured.
    fn bucket_filings(&self, payload: &Value) -> BTreeMap<CountryCode, Vec<String>> {
        let mut buckets: BTreeMap<CountryCode, Vec<String>> = BTreeMap::new();

        let worldwide = match payload.get("worldwide_applications").and_then(|v| v.as_object()) {
            Some(map) => map,
            None => return buckets,
        };

        for applications in worldwide.values() {
            let entries = match applications.as_array() {
                Some(entries) => entries,
                None => continue,
            };

            for entry in entries {
                let doc_id = entry
                    .get("document_id")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .trim();
                if doc_id.is_empty() {
                    continue;
                }

                let code = match CountryCode::from_doc_id(doc_id) {
                    Some(code) => code,
                    None => continue,
                };
                if code.as_str() == "WO" {
                    continue;
                }
                if code != self.target && !self.config.keep_other_jurisdictions {
                    continue;
                }

                buckets.entry(code).or_default().push(doc_id.to_string());
            }
        }

        buckets
    }
}

fn first_organic_result(payload: &Value) -> Option<&Value> {
    payload
        .get("organic_results")
        .and_then(|v| v.as_array())
        .and_then(|results| results.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use patfinder_search::{Result as SearchResult, SearchError};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockProvider {
        patent_search: Mutex<VecDeque<SearchResult<Value>>>,
        fetch_json: Mutex<VecDeque<SearchResult<Value>>>,
        details: Mutex<VecDeque<SearchResult<Value>>>,
    }

    impl MockProvider {
        fn pop(queue: &Mutex<VecDeque<SearchResult<Value>>>) -> SearchResult<Value> {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(SearchError::Internal("mock exhausted".to_string())))
        }
    }

    #[async_trait]
    impl SearchProvider for MockProvider {
        async fn keyword_search(&self, _query: &str, _stats: &StatsCollector) -> SearchResult<Value> {
            Err(SearchError::Internal("not scripted".to_string()))
        }

        async fn patent_search(&self, _query: &str, _stats: &StatsCollector) -> SearchResult<Value> {
            Self::pop(&self.patent_search)
        }

        async fn patent_details(
            &self,
            _patent_id: &str,
            _stats: &StatsCollector,
        ) -> SearchResult<Value> {
            Self::pop(&self.details)
        }

        async fn fetch_json(
            &self,
            _url: &str,
            _long_timeout: bool,
            _stats: &StatsCollector,
        ) -> SearchResult<Value> {
            Self::pop(&self.fetch_json)
        }

        async fn web_search(&self, _query: &str, _stats: &StatsCollector) -> SearchResult<String> {
            Err(SearchError::Internal("not scripted".to_string()))
        }

        fn append_credential(&self, url: &str) -> String {
            format!("{url}&api_key=test")
        }

        fn provider_id(&self) -> &str {
            "mock"
        }
    }

    fn config() -> NavigationConfig {
        NavigationConfig {
            delay_between_details_ms: 0,
            ..NavigationConfig::default()
        }
    }

    fn navigator(provider: Arc<MockProvider>) -> FamilyNavigator {
        FamilyNavigator::new(provider, &config()).expect("build navigator")
    }

    fn wo() -> WoNumber {
        WoNumber::new("WO2011051540").unwrap()
    }

    fn search_payload(with_endpoint: bool) -> Value {
        let mut payload = json!({
            "organic_results": [{
                "title": "Androgen receptor modulating compounds",
                "assignee": "Orion Corporation"
            }]
        });
        if with_endpoint {
            payload["search_metadata"] =
                json!({"json_endpoint": "https://provider.test/searches/abc.json"});
        }
        payload
    }

    fn family_payload() -> Value {
        json!({
            "worldwide_applications": {
                "2011": [
                    {"document_id": "WO2011051540A1"},
                    {"document_id": "EP2634175A1"}
                ],
                "2012": [
                    {"document_id": "BR112012023652A2"},
                    {"document_id": "US9657003B2"},
                    {"document_id": ""}
                ]
            }
        })
    }

    #[tokio::test]
    async fn test_missing_continuation_never_raises() {
        let provider = Arc::new(MockProvider {
            patent_search: Mutex::new(vec![Ok(search_payload(false))].into()),
            ..MockProvider::default()
        });
        let nav = navigator(provider.clone());
        let fetcher = DetailFetcher::new(provider, &config());
        let stats = StatsCollector::new();

        let outcome = nav.process(&wo(), &fetcher, &stats).await;

        assert_eq!(outcome.record.status, FamilyStatus::NoContinuation);
        assert!(outcome.record.filings.is_empty());
        assert!(outcome.details.is_empty());
        assert_eq!(outcome.record.title, "Androgen receptor modulating compounds");
        assert_eq!(outcome.record.assignee.as_deref(), Some("Orion Corporation"));
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.families_processed, 1);
        assert_eq!(snapshot.families_skipped, 1);
        assert_eq!(snapshot.families_errored, 0);
    }

    #[tokio::test]
    async fn test_continuation_fetch_failure_is_no_family_data() {
        let provider = Arc::new(MockProvider {
            patent_search: Mutex::new(vec![Ok(search_payload(true))].into()),
            fetch_json: Mutex::new(vec![Err(SearchError::Timeout { seconds: 120 })].into()),
            ..MockProvider::default()
        });
        let nav = navigator(provider.clone());
        let fetcher = DetailFetcher::new(provider, &config());
        let stats = StatsCollector::new();

        let outcome = nav.process(&wo(), &fetcher, &stats).await;

        assert_eq!(outcome.record.status, FamilyStatus::NoFamilyData);
        assert_eq!(stats.snapshot().families_skipped, 1);
    }

    #[tokio::test]
    async fn test_search_error_becomes_error_record() {
        let provider = Arc::new(MockProvider::default());
        let nav = navigator(provider.clone());
        let fetcher = DetailFetcher::new(provider, &config());
        let stats = StatsCollector::new();

        let outcome = nav.process(&wo(), &fetcher, &stats).await;

        assert_eq!(outcome.record.status, FamilyStatus::Error);
        assert!(outcome.record.error.as_deref().unwrap_or_default().contains("mock exhausted"));
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.families_errored, 1);
        assert_eq!(snapshot.errors_by_source.get("family_navigation"), Some(&1));
    }

    #[tokio::test]
    async fn test_full_navigation_buckets_and_fetches_details() {
        let provider = Arc::new(MockProvider {
            patent_search: Mutex::new(vec![Ok(search_payload(true))].into()),
            fetch_json: Mutex::new(
                vec![
                    Ok(json!({
                        "organic_results": [
                            {"serpapi_link": "https://provider.test/patents/WO2011051540"}
                        ]
                    })),
                    Ok(family_payload()),
                ]
                .into(),
            ),
            details: Mutex::new(vec![Ok(json!({"title": "BR filing"}))].into()),
        });
        let nav = navigator(provider.clone());
        let fetcher = DetailFetcher::new(provider, &config());
        let stats = StatsCollector::new();

        let outcome = nav.process(&wo(), &fetcher, &stats).await;

        assert_eq!(outcome.record.status, FamilyStatus::Success);
        let br = CountryCode::new("BR").unwrap();
        assert_eq!(
            outcome.record.filings.get(&br),
            Some(&vec!["BR112012023652A2".to_string()])
        );
        // Root publication entries are skipped, other jurisdictions kept.
        assert_eq!(outcome.record.filings.len(), 3);
        assert!(outcome.record.filings.contains_key(&CountryCode::new("EP").unwrap()));
        assert!(outcome.record.filings.contains_key(&CountryCode::new("US").unwrap()));
        assert_eq!(outcome.details.len(), 1);
        assert_eq!(outcome.details[0].number, "BR112012023652A2");
        assert_eq!(
            outcome.details[0].source_wo.as_ref().map(WoNumber::as_str),
            Some("WO2011051540")
        );
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.families_with_filings, 1);
        assert_eq!(snapshot.filings_found, 1);
        assert_eq!(snapshot.details_fetched, 1);
    }

    #[tokio::test]
    async fn test_family_without_target_filings_is_no_filings() {
        let family = json!({
            "worldwide_applications": {
                "2011": [{"document_id": "US9657003B2"}, {"document_id": "JP2013545749A"}]
            }
        });
        let provider = Arc::new(MockProvider {
            patent_search: Mutex::new(vec![Ok(search_payload(true))].into()),
            fetch_json: Mutex::new(
                vec![
                    Ok(json!({"organic_results": [{"serpapi_link": "https://provider.test/p"}]})),
                    Ok(family),
                ]
                .into(),
            ),
            ..MockProvider::default()
        });
        let nav = navigator(provider.clone());
        let fetcher = DetailFetcher::new(provider, &config());
        let stats = StatsCollector::new();

        let outcome = nav.process(&wo(), &fetcher, &stats).await;

        assert_eq!(outcome.record.status, FamilyStatus::NoFilings);
        assert_eq!(outcome.record.filings.len(), 2);
        assert!(outcome.details.is_empty());
        assert_eq!(stats.snapshot().families_with_filings, 0);
    }

    #[tokio::test]
    async fn test_target_only_mode_drops_other_jurisdictions() {
        let provider = Arc::new(MockProvider {
            patent_search: Mutex::new(vec![Ok(search_payload(true))].into()),
            fetch_json: Mutex::new(
                vec![
                    Ok(json!({"organic_results": [{"serpapi_link": "https://provider.test/p"}]})),
                    Ok(family_payload()),
                ]
                .into(),
            ),
            details: Mutex::new(vec![Ok(json!({"title": "BR filing"}))].into()),
        });
        let config = NavigationConfig {
            keep_other_jurisdictions: false,
            delay_between_details_ms: 0,
            ..NavigationConfig::default()
        };
        let nav = FamilyNavigator::new(provider.clone(), &config).expect("build navigator");
        let fetcher = DetailFetcher::new(provider, &config);
        let stats = StatsCollector::new();

        let outcome = nav.process(&wo(), &fetcher, &stats).await;

        assert_eq!(outcome.record.filings.len(), 1);
        assert!(outcome
            .record
            .filings
            .contains_key(&CountryCode::new("BR").unwrap()));
    }
}
