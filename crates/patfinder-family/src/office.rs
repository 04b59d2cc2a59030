//! Patent-office backup search.
//!
//! When family navigation comes up short, the run falls back to an
//! OPS-style published-data search at the patent office, one query per
//! discovered publication. Requires client credentials; without them the
//! client is simply not constructed and the backup stage is skipped.

use crate::error::{FamilyError, Result};
use patfinder_core::{
    AppConfig, OfficeConfig, RequestLog, StatsCollector, TtlCache, WoNumber,
};
use patfinder_search::FilingMatcher;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client for the patent office published-data API.
pub struct PatentOfficeClient {
    client: reqwest::Client,
    config: OfficeConfig,
    matcher: FilingMatcher,
    tokens: TtlCache<String, String>,
    consumer_key: String,
    consumer_secret: String,
}

impl PatentOfficeClient {
    /// Build a client from configuration.
    ///
    /// Returns `Ok(None)` when credentials are not configured, which
    /// disables the backup stage for the run.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>> {
        let (consumer_key, consumer_secret) = match (
            config.office.consumer_key.clone(),
            config.office.consumer_secret.clone(),
        ) {
            (Some(key), Some(secret)) => (key, secret),
            _ => {
                tracing::debug!("Office credentials not configured, backup search disabled");
                return Ok(None);
            }
        };

        let matcher = FilingMatcher::new(
            &config.navigation.target_jurisdiction,
            config.navigation.min_filing_length,
        )?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.office.timeout_secs))
            .build()?;

        Ok(Some(Self {
            client,
            config: config.office.clone(),
            matcher,
            tokens: TtlCache::new(Duration::from_secs(config.office.token_ttl_secs)),
            consumer_key,
            consumer_secret,
        }))
    }

    /// Backup search over the first `office.max_families` publications.
    ///
    /// Per-publication failures are logged and tallied, never fatal. The
    /// result pairs each publication with the target-jurisdiction filing
    /// identifiers found in its published data.
    pub async fn backup_filings(
        &self,
        wos: &[WoNumber],
        stats: &StatsCollector,
    ) -> Vec<(WoNumber, Vec<String>)> {
        let mut found = Vec::new();

        for wo in wos.iter().take(self.config.max_families) {
            match self.family_filings(wo, stats).await {
                Ok(ids) if !ids.is_empty() => {
                    tracing::info!("Office search for {} found {} filings", wo, ids.len());
                    found.push((wo.clone(), ids));
                }
                Ok(_) => {
                    tracing::debug!("Office search for {} found no filings", wo);
                }
                Err(e) => {
                    tracing::warn!("Office search for {} failed: {}", wo, e);
                    stats.record_error("office");
                }
            }

            tokio::time::sleep(Duration::from_millis(self.config.delay_between_requests_ms))
                .await;
        }

        found
    }

    /// Search published data for one publication and extract
    /// target-jurisdiction filing identifiers from the response.
    pub async fn family_filings(&self, wo: &WoNumber, stats: &StatsCollector) -> Result<Vec<String>> {
        let token = self.access_token(stats).await?;

        let url = format!("{}/rest-services/published-data/search", self.config.base_url);
        let start = Instant::now();
        let response = self
            .client
            .get(&url)
            .query(&[("q", wo.as_str())])
            .bearer_auth(&token)
            .header(ACCEPT, "application/json")
            .send()
            .await;

        let step = format!("office_family_{wo}");
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                stats.record_request(RequestLog {
                    step,
                    url,
                    status: None,
                    response_bytes: 0,
                    elapsed_ms: elapsed_ms(start),
                    error: Some(e.to_string()),
                });
                return Err(FamilyError::Network(e));
            }
        };

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        stats.record_request(RequestLog {
            step,
            url,
            status: Some(status.as_u16()),
            response_bytes: body.len(),
            elapsed_ms: elapsed_ms(start),
            error: (!status.is_success()).then(|| format!("status {}", status.as_u16())),
        });

        if !status.is_success() {
            return Err(FamilyError::OfficeApi {
                status: status.as_u16(),
                message: body,
            });
        }

        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| FamilyError::Internal(format!("office response parse error: {e}")))?;
        Ok(self.matcher.extract_from_value(&payload))
    }

    async fn access_token(&self, stats: &StatsCollector) -> Result<String> {
        self.tokens
            .get_or_refresh("office".to_string(), || self.request_token(stats))
            .await
    }

    async fn request_token(&self, stats: &StatsCollector) -> Result<String> {
        let url = format!("{}/auth/accesstoken", self.config.base_url);
        let start = Instant::now();
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.consumer_key, Some(&self.consumer_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                stats.record_request(RequestLog {
                    step: "office_token".to_string(),
                    url,
                    status: None,
                    response_bytes: 0,
                    elapsed_ms: elapsed_ms(start),
                    error: Some(e.to_string()),
                });
                return Err(FamilyError::Network(e));
            }
        };

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        stats.record_request(RequestLog {
            step: "office_token".to_string(),
            url,
            status: Some(status.as_u16()),
            response_bytes: body.len(),
            elapsed_ms: elapsed_ms(start),
            error: (!status.is_success()).then(|| format!("status {}", status.as_u16())),
        });

        if !status.is_success() {
            return Err(FamilyError::OfficeApi {
                status: status.as_u16(),
                message: body,
            });
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| FamilyError::OfficeAuth(format!("unexpected token response: {e}")))?;
        if token.access_token.is_empty() {
            return Err(FamilyError::OfficeAuth("empty access token".to_string()));
        }

        tracing::debug!("Office access token renewed");
        Ok(token.access_token)
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
