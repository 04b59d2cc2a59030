//! Compound profile resolution against a synonym service.

use crate::error::{ChemError, Result};
use crate::profile::MolecularProfile;
use async_trait::async_trait;
use patfinder_core::{ChemConfig, RequestLog, RetryPolicy, StatsCollector};
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Resolves a molecule name into a structured identifier profile.
///
/// The bundled HTTP implementation degrades to an empty profile for
/// routine lookup failures; an `Err` from this trait aborts the run, so
/// implementations should reserve it for failures the pipeline cannot
/// reasonably continue past.
#[async_trait]
pub trait ProfileResolver: Send + Sync {
    /// Resolve `name` into a profile.
    async fn resolve(&self, name: &str, stats: &StatsCollector) -> Result<MolecularProfile>;
}

#[derive(Debug, Deserialize)]
struct SynonymResponse {
    #[serde(rename = "InformationList")]
    information_list: Option<InformationList>,
}

#[derive(Debug, Deserialize)]
struct InformationList {
    #[serde(rename = "Information", default)]
    information: Vec<Information>,
}

#[derive(Debug, Deserialize)]
struct Information {
    #[serde(rename = "Synonym", default)]
    synonym: Vec<String>,
}

impl SynonymResponse {
    fn into_synonyms(self) -> Vec<String> {
        self.information_list
            .and_then(|list| list.information.into_iter().next())
            .map(|info| info.synonym)
            .unwrap_or_default()
    }
}

/// `ProfileResolver` backed by a PubChem-compatible REST service.
pub struct ChemLookupResolver {
    client: reqwest::Client,
    config: ChemConfig,
    retry: RetryPolicy,
}

impl ChemLookupResolver {
    /// Create a resolver from configuration.
    pub fn new(config: ChemConfig, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChemError::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            retry,
        })
    }

    fn synonyms_url(&self, name: &str) -> String {
        format!(
            "{}/compound/name/{}/synonyms/JSON",
            self.config.base_url, name
        )
    }

    /// One lookup attempt. A non-2xx status is a routine miss and yields
    /// an empty list; transport and parse failures surface as errors.
    async fn fetch_synonyms(&self, name: &str, stats: &StatsCollector) -> Result<Vec<String>> {
        let url = self.synonyms_url(name);
        let started = Instant::now();

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                stats.record_request(RequestLog {
                    step: "chem_lookup".to_string(),
                    url,
                    status: None,
                    response_bytes: 0,
                    elapsed_ms: elapsed_ms(started),
                    error: Some(e.to_string()),
                });
                if e.is_timeout() {
                    return Err(ChemError::Timeout {
                        seconds: self.config.timeout_secs,
                    });
                }
                return Err(ChemError::Network(e));
            }
        };

        let status = response.status();
        let body = response.text().await.map_err(ChemError::Network)?;
        stats.record_request(RequestLog {
            step: "chem_lookup".to_string(),
            url,
            status: Some(status.as_u16()),
            response_bytes: body.len(),
            elapsed_ms: elapsed_ms(started),
            error: None,
        });

        if !status.is_success() {
            tracing::debug!(
                "Synonym lookup for {} returned status {}",
                name,
                status.as_u16()
            );
            return Ok(Vec::new());
        }

        let parsed: SynonymResponse =
            serde_json::from_str(&body).map_err(|e| ChemError::Parse {
                message: e.to_string(),
            })?;
        Ok(parsed.into_synonyms())
    }
}

#[async_trait]
impl ProfileResolver for ChemLookupResolver {
    async fn resolve(&self, name: &str, stats: &StatsCollector) -> Result<MolecularProfile> {
        let outcome = self
            .retry
            .run("chem_lookup", stats, || self.fetch_synonyms(name, stats))
            .await;

        match outcome {
            Ok(synonyms) if synonyms.is_empty() => {
                tracing::debug!("No synonyms found for {}, using empty profile", name);
                Ok(MolecularProfile::empty(name))
            }
            Ok(synonyms) => {
                let profile = MolecularProfile::from_synonyms(name, &synonyms, &self.config);
                tracing::info!(
                    "Resolved profile for {}: {} dev codes, {} CAS numbers, {} IUPAC names",
                    name,
                    profile.dev_codes.len(),
                    profile.all_cas_numbers.len(),
                    profile.iupac_names.len()
                );
                Ok(profile)
            }
            Err(error) => {
                tracing::warn!(
                    "Compound lookup for {} failed: {}, continuing with empty profile",
                    name,
                    error
                );
                stats.record_error("chem_lookup");
                Ok(MolecularProfile::empty(name))
            }
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
