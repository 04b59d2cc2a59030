//! Patfinder Registry - National-registry deep search.
//!
//! Queries a national medicine registry proxy for patent filings linked to
//! a molecule. The search casts a wide net: the molecule name in several
//! casings, each development code with separator-stripped variants, and the
//! CAS number, capped and deduplicated before any request goes out.
//!
//! # Query Expansion
//!
//! For "Darolutamide" with dev code `ODM-201` and CAS `1297538-32-9`:
//!
//! ```text
//! Darolutamide, darolutamide, DAROLUTAMIDE,
//! ODM-201, ODM201,
//! 1297538-32-9
//! ```
//!
//! Per-query failures are logged and tallied but never abort the search;
//! a run with a broken registry endpoint simply returns fewer filings.

use patfinder_core::{AppConfig, RegistryConfig, RequestLog, StatsCollector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Registry search errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Transport-level failure talking to the registry proxy
    #[error("registry network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body was not the expected JSON shape
    #[error("registry response parse error: {0}")]
    Parse(String),
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// One filing returned by the registry proxy.
///
/// The proxy's record schema is loose, so the full payload is kept
/// alongside the title used for deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryFiling {
    /// Filing title as reported by the registry
    pub title: String,
    /// Complete registry record
    pub raw: Value,
}

/// Client for the national-registry search proxy.
pub struct RegistryClient {
    client: reqwest::Client,
    base_url: String,
    config: RegistryConfig,
}

impl RegistryClient {
    /// Build a client from configuration.
    ///
    /// Returns `Ok(None)` when no registry endpoint is configured, which
    /// disables the deep-search stage for the run.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>> {
        let base_url = match config.registry.base_url.clone() {
            Some(url) => url,
            None => {
                tracing::debug!("Registry endpoint not configured, deep search disabled");
                return Ok(None);
            }
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.registry.timeout_secs))
            .build()?;

        Ok(Some(Self {
            client,
            base_url,
            config: config.registry.clone(),
        }))
    }

    /// Run the expanded query set against the registry proxy.
    ///
    /// Never fails as a whole: queries that error are tallied under
    /// `registry` and skipped. Results are deduplicated by normalized
    /// title, keeping first-seen order.
    pub async fn deep_search(
        &self,
        molecule: &str,
        dev_codes: &[String],
        cas: Option<&str>,
        stats: &StatsCollector,
    ) -> Vec<RegistryFiling> {
        let queries = build_queries(molecule, dev_codes, cas, &self.config);
        tracing::info!("Registry search for {}: {} queries", molecule, queries.len());
        stats.add_registry_queries(queries.len() as u64);

        let mut filings = Vec::new();
        for (i, query) in queries.iter().enumerate() {
            tracing::debug!("Registry query {}/{}: {}", i + 1, queries.len(), query);
            match self.fetch_query(query, stats).await {
                Ok(found) if !found.is_empty() => {
                    tracing::info!("Registry query {} found {} filings", query, found.len());
                    filings.extend(found);
                }
                Ok(_) => {
                    tracing::debug!("Registry query {} found no filings", query);
                }
                Err(e) => {
                    tracing::warn!("Registry query {} failed: {}", query, e);
                    stats.record_error("registry");
                    continue;
                }
            }

            tokio::time::sleep(Duration::from_millis(self.config.delay_between_queries_ms))
                .await;
        }

        let unique = dedup_by_title(filings);
        stats.add_registry_results(unique.len() as u64);
        tracing::info!("Registry search complete: {} unique filings", unique.len());
        unique
    }

    async fn fetch_query(
        &self,
        query: &str,
        stats: &StatsCollector,
    ) -> Result<Vec<RegistryFiling>> {
        let start = Instant::now();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("medicine", query)])
            .send()
            .await;

        let step = format!("registry_{query}");
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                stats.record_request(RequestLog {
                    step,
                    url: self.base_url.clone(),
                    status: None,
                    response_bytes: 0,
                    elapsed_ms: elapsed_ms(start),
                    error: Some(e.to_string()),
                });
                return Err(RegistryError::Network(e));
            }
        };

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        stats.record_request(RequestLog {
            step,
            url: self.base_url.clone(),
            status: Some(status.as_u16()),
            response_bytes: body.len(),
            elapsed_ms: elapsed_ms(start),
            error: (!status.is_success()).then(|| format!("status {}", status.as_u16())),
        });

        if !status.is_success() {
            tracing::debug!("Registry returned status {} for {}", status.as_u16(), query);
            return Ok(Vec::new());
        }

        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| RegistryError::Parse(e.to_string()))?;
        let items = payload
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(items
            .into_iter()
            .map(|raw| RegistryFiling {
                title: raw
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                raw,
            })
            .collect())
    }
}

/// Expand a molecule into registry queries: name casings, dev-code
/// variants, CAS. Order-preserving dedup, capped at `max_queries`.
fn build_queries(
    molecule: &str,
    dev_codes: &[String],
    cas: Option<&str>,
    config: &RegistryConfig,
) -> Vec<String> {
    let mut raw = vec![
        molecule.to_string(),
        molecule.to_lowercase(),
        molecule.to_uppercase(),
    ];

    for code in dev_codes.iter().take(config.max_dev_codes) {
        raw.push(code.clone());
        raw.push(code.replace('-', ""));
        raw.push(code.replace(' ', ""));
    }

    if let Some(cas) = cas {
        raw.push(cas.to_string());
    }

    let mut seen = HashSet::new();
    let mut queries: Vec<String> = raw.into_iter().filter(|q| seen.insert(q.clone())).collect();
    queries.truncate(config.max_queries);
    queries
}

/// Deduplicate filings by title with spaces stripped and case folded.
/// Filings with an empty normalized title are dropped.
fn dedup_by_title(filings: Vec<RegistryFiling>) -> Vec<RegistryFiling> {
    let mut seen = HashSet::new();
    filings
        .into_iter()
        .filter(|filing| {
            let key: String = filing
                .title
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_uppercase();
            !key.is_empty() && seen.insert(key)
        })
        .collect()
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filing(title: &str) -> RegistryFiling {
        RegistryFiling {
            title: title.to_string(),
            raw: json!({ "title": title }),
        }
    }

    #[test]
    fn test_build_queries_expands_and_dedups() {
        let dev_codes = vec![
            "ODM-201".to_string(),
            "BAY 1841788".to_string(),
            "ODM-201".to_string(),
        ];
        let queries = build_queries(
            "Darolutamide",
            &dev_codes,
            Some("1297538-32-9"),
            &RegistryConfig::default(),
        );

        assert_eq!(
            queries,
            vec![
                "Darolutamide",
                "darolutamide",
                "DAROLUTAMIDE",
                "ODM-201",
                "ODM201",
                "BAY 1841788",
                "BAY1841788",
                "1297538-32-9",
            ]
        );
    }

    #[test]
    fn test_build_queries_respects_caps() {
        let dev_codes: Vec<String> = (0..12).map(|i| format!("AB-{i:04}")).collect();
        let config = RegistryConfig::default();
        let queries = build_queries("molecule", &dev_codes, Some("50-78-2"), &config);

        assert_eq!(queries.len(), config.max_queries);
        // Name casings come first, and the eleventh and twelfth codes
        // never contribute
        assert_eq!(queries[0], "molecule");
        assert!(!queries.iter().any(|q| q.contains("0010")));
        assert!(!queries.iter().any(|q| q.contains("0011")));
    }

    #[test]
    fn test_build_queries_without_cas() {
        let queries = build_queries("aspirin", &[], None, &RegistryConfig::default());
        assert_eq!(queries, vec!["aspirin", "ASPIRIN"]);
    }

    #[test]
    fn test_dedup_by_title_first_seen() {
        let filings = vec![
            filing("Pharmaceutical composition"),
            filing("PHARMACEUTICAL  COMPOSITION"),
            filing(""),
            filing("Crystalline form"),
        ];

        let unique = dedup_by_title(filings);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].title, "Pharmaceutical composition");
        assert_eq!(unique[1].title, "Crystalline form");
    }

    #[test]
    fn test_client_disabled_without_base_url() {
        let client = RegistryClient::from_config(&AppConfig::default()).unwrap();
        assert!(client.is_none());

        let mut configured = AppConfig::default();
        configured.registry.base_url = Some("https://registry.example/api/patents".to_string());
        assert!(RegistryClient::from_config(&configured).unwrap().is_some());
    }
}
