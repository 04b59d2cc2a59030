//! Bibliographic detail fetching for national filings.
//!
//! One fetcher instance lives for the duration of a run. It remembers
//! every filing identifier it has been asked about, so the same filing
//! reached through two families is fetched once, and it stops issuing
//! requests once the per-run budget is spent.

use patfinder_core::{CountryCode, NavigationConfig, StatsCollector, WoNumber};
use patfinder_search::SearchProvider;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Bibliographic record for one national filing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingDetail {
    /// Filing identifier as published, e.g. `BR112012023652A2`.
    pub number: String,
    /// Two-letter jurisdiction prefix of the identifier.
    pub jurisdiction: String,
    /// Patent title.
    pub title: String,
    /// Abstract, truncated for payload-size control.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Current assignee.
    pub assignee: String,
    /// Inventor names.
    pub inventors: Vec<String>,
    /// Filing date as reported by the provider.
    pub filing_date: String,
    /// Publication date as reported by the provider.
    pub publication_date: String,
    /// Legal status as reported by the provider.
    pub legal_status: String,
    /// Classification entries, kept in provider shape.
    pub classifications: Vec<Value>,
    /// Patent viewer URL.
    pub link: String,
    /// Publication this filing was reached through.
    pub source_wo: Option<WoNumber>,
}

#[derive(Default)]
struct FetchState {
    seen: HashSet<String>,
    attempts: usize,
}

enum Reservation {
    New,
    Duplicate,
    BudgetExhausted,
}

/// Fetches filing details with run-wide deduplication and a fetch budget.
pub struct DetailFetcher {
    provider: Arc<dyn SearchProvider>,
    config: NavigationConfig,
    state: Mutex<FetchState>,
}

impl DetailFetcher {
    /// Create a fetcher for one run.
    pub fn new(provider: Arc<dyn SearchProvider>, config: &NavigationConfig) -> Self {
        Self {
            provider,
            config: config.clone(),
            state: Mutex::new(FetchState::default()),
        }
    }

    /// Fetch details for a batch of filing identifiers.
    ///
    /// Identifiers already fetched this run are skipped, and the batch is
    /// cut short once the run-wide budget is spent. A failed fetch drops
    /// that filing's detail but never the batch.
    pub async fn fetch_all(
        &self,
        ids: &[String],
        source_wo: Option<&WoNumber>,
        stats: &StatsCollector,
    ) -> Vec<FilingDetail> {
        let mut details = Vec::new();

        for id in ids {
            match self.reserve(id) {
                Reservation::Duplicate => continue,
                Reservation::BudgetExhausted => {
                    tracing::debug!(
                        "Detail budget of {} spent, skipping remaining filings",
                        self.config.max_details
                    );
                    break;
                }
                Reservation::New => {}
            }

            match self.provider.patent_details(id, stats).await {
                Ok(payload) => {
                    stats.record_detail_fetched();
                    details.push(self.map_detail(id, source_wo, &payload));
                }
                Err(e) => {
                    tracing::warn!("Detail fetch failed for {}: {}", id, e);
                    stats.record_detail_failed();
                }
            }

            tokio::time::sleep(Duration::from_millis(self.config.delay_between_details_ms)).await;
        }

        details
    }

    /// Number of detail fetches issued so far this run.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }

    fn reserve(&self, id: &str) -> Reservation {
        let mut state = self.lock();
        if state.seen.contains(id) {
            Reservation::Duplicate
        } else if state.attempts >= self.config.max_details {
            Reservation::BudgetExhausted
        } else {
            state.seen.insert(id.to_string());
            state.attempts += 1;
            Reservation::New
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FetchState> {
        self.state.lock().expect("acquire detail fetch state lock")
    }

    fn map_detail(&self, number: &str, source_wo: Option<&WoNumber>, payload: &Value) -> FilingDetail {
        let text = |key: &str| {
            payload
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };

        FilingDetail {
            number: number.to_string(),
            jurisdiction: CountryCode::from_doc_id(number)
                .map(|code| code.as_str().to_string())
                .unwrap_or_default(),
            title: text("title"),
            abstract_text: truncate_chars(&text("abstract"), self.config.abstract_max_len),
            assignee: text("assignee"),
            inventors: inventor_names(payload.get("inventors")),
            filing_date: text("filing_date"),
            publication_date: text("publication_date"),
            legal_status: text("legal_status"),
            classifications: payload
                .get("classifications")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default(),
            link: payload
                .get("url")
                .and_then(|v| v.as_str())
                .map_or_else(
                    || format!("https://patents.google.com/patent/{number}"),
                    ToString::to_string,
                ),
            source_wo: source_wo.cloned(),
        }
    }
}

/// Inventors arrive either as plain strings or as objects with a `name`
/// field depending on the provider; accept both.
fn inventor_names(value: Option<&Value>) -> Vec<String> {
    let entries = match value.and_then(|v| v.as_array()) {
        Some(entries) => entries,
        None => return Vec::new(),
    };

    entries
        .iter()
        .filter_map(|entry| {
            entry
                .as_str()
                .or_else(|| entry.get("name").and_then(|v| v.as_str()))
                .map(ToString::to_string)
        })
        .collect()
}

/// Truncate on a character boundary.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
