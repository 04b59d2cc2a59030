//! SerpApi-backed search provider.

use crate::error::{Result, SearchError};
use crate::provider::SearchProvider;
use async_trait::async_trait;
use patfinder_core::{RequestLog, SearchConfig, StatsCollector};
use serde_json::Value;
use std::time::{Duration, Instant};

const PROVIDER_ID: &str = "serpapi";

/// Provider implementation for the SerpApi JSON endpoint, plus a direct
/// web-search fallback used when the structured engine yields nothing.
pub struct SerpApiProvider {
    client: reqwest::Client,
    base_url: String,
    web_search_url: String,
    api_key: String,
    user_agent: String,
    result_count: String,
    timeout: Duration,
    long_timeout: Duration,
    web_timeout: Duration,
}

impl SerpApiProvider {
    /// Create a new provider with the given API key.
    ///
    /// Timeouts are applied per request, so the underlying client carries
    /// none of its own.
    pub fn new(api_key: impl Into<String>, config: &SearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| SearchError::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            web_search_url: config.web_search_url.clone(),
            api_key: api_key.into(),
            user_agent: config.user_agent.clone(),
            result_count: config.result_count.to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
            long_timeout: Duration::from_secs(config.long_timeout_secs),
            web_timeout: Duration::from_secs(config.web_timeout_secs),
        })
    }

    /// Issue a GET, record it on `stats`, and return the body on 2xx.
    async fn get_text(
        &self,
        step: &str,
        request: reqwest::RequestBuilder,
        logged_url: String,
        timeout: Duration,
        stats: &StatsCollector,
    ) -> Result<String> {
        let started = Instant::now();

        let response = match request.timeout(timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                stats.record_request(RequestLog {
                    step: step.to_string(),
                    url: logged_url,
                    status: None,
                    response_bytes: 0,
                    elapsed_ms: elapsed_ms(started),
                    error: Some(e.to_string()),
                });
                if e.is_timeout() {
                    return Err(SearchError::Timeout {
                        seconds: timeout.as_secs(),
                    });
                }
                return Err(SearchError::Network(e));
            }
        };

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        stats.record_request(RequestLog {
            step: step.to_string(),
            url: logged_url,
            status: Some(status.as_u16()),
            response_bytes: body.len(),
            elapsed_ms: elapsed_ms(started),
            error: (!status.is_success()).then(|| format!("status {}", status.as_u16())),
        });

        if !status.is_success() {
            return Err(SearchError::from_status(PROVIDER_ID, status.as_u16(), body));
        }

        Ok(body)
    }

    /// GET against the provider endpoint with query params and parse JSON.
    async fn engine_request(
        &self,
        step: &str,
        params: &[(&str, &str)],
        stats: &StatsCollector,
    ) -> Result<Value> {
        let request = self.client.get(&self.base_url).query(params);
        let body = self
            .get_text(step, request, self.base_url.clone(), self.timeout, stats)
            .await?;

        serde_json::from_str(&body).map_err(|e| SearchError::Parse {
            provider: PROVIDER_ID.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl SearchProvider for SerpApiProvider {
    async fn keyword_search(&self, query: &str, stats: &StatsCollector) -> Result<Value> {
        let params = [
            ("engine", "google"),
            ("q", query),
            ("api_key", self.api_key.as_str()),
            ("num", self.result_count.as_str()),
        ];
        self.engine_request("keyword_search", &params, stats).await
    }

    async fn patent_search(&self, query: &str, stats: &StatsCollector) -> Result<Value> {
        let params = [
            ("engine", "google_patents"),
            ("q", query),
            ("api_key", self.api_key.as_str()),
            ("num", self.result_count.as_str()),
        ];
        self.engine_request(&format!("patent_search_{query}"), &params, stats)
            .await
    }

    async fn patent_details(&self, patent_id: &str, stats: &StatsCollector) -> Result<Value> {
        let params = [
            ("engine", "google_patents_details"),
            ("patent_id", patent_id),
            ("api_key", self.api_key.as_str()),
        ];
        self.engine_request(&format!("patent_details_{patent_id}"), &params, stats)
            .await
    }

    async fn fetch_json(
        &self,
        url: &str,
        long_timeout: bool,
        stats: &StatsCollector,
    ) -> Result<Value> {
        let timeout = if long_timeout {
            self.long_timeout
        } else {
            self.timeout
        };
        let request = self.client.get(url);
        let body = self
            .get_text("fetch_json", request, strip_credential(url), timeout, stats)
            .await?;

        serde_json::from_str(&body).map_err(|e| SearchError::Parse {
            provider: PROVIDER_ID.to_string(),
            message: e.to_string(),
        })
    }

    async fn web_search(&self, query: &str, stats: &StatsCollector) -> Result<String> {
        let request = self
            .client
            .get(&self.web_search_url)
            .query(&[("q", query)])
            .header(reqwest::header::USER_AGENT, &self.user_agent);
        self.get_text(
            "web_search",
            request,
            self.web_search_url.clone(),
            self.web_timeout,
            stats,
        )
        .await
    }

    fn append_credential(&self, url: &str) -> String {
        format!("{url}&api_key={}", self.api_key)
    }

    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }
}

/// Remove any `api_key` query parameter so URLs are safe to log.
fn strip_credential(url: &str) -> String {
    match url.split_once('?') {
        Some((base, query)) => {
            let kept: Vec<&str> = query
                .split('&')
                .filter(|param| !param.starts_with("api_key="))
                .collect();
            if kept.is_empty() {
                base.to_string()
            } else {
                format!("{base}?{}", kept.join("&"))
            }
        }
        None => url.to_string(),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
