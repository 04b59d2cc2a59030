//! Pipeline orchestration.
//!
//! One [`PatentPipeline::search`] call runs the full stage chain: profile
//! resolution, publication discovery, family navigation with detail
//! fetching, the conditional patent-office backup, and the optional
//! registry deep search. Stage failures degrade into statistics; the whole
//! run fails only when a stage the pipeline cannot continue past raises.

use crate::error::{PipelineError, Result};
use crate::result::SearchResult;
use patfinder_chem::{ChemLookupResolver, MolecularProfile, ProfileResolver};
use patfinder_core::{AppConfig, RetryPolicy, Stage, StatsCollector, TtlCache, WoNumber};
use patfinder_family::{DetailFetcher, FamilyNavigator, FilingDetail, PatentOfficeClient};
use patfinder_registry::RegistryClient;
use patfinder_search::{build_query_plan, DiscoveryExecutor, SearchProvider, SerpApiProvider};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The patent discovery pipeline.
///
/// Holds the injected collaborators and a TTL result cache; a single
/// instance serves any number of sequential or concurrent runs.
pub struct PatentPipeline {
    config: AppConfig,
    provider: Arc<dyn SearchProvider>,
    resolver: Arc<dyn ProfileResolver>,
    executor: DiscoveryExecutor,
    navigator: FamilyNavigator,
    office: Option<PatentOfficeClient>,
    registry: Option<RegistryClient>,
    results: TtlCache<String, SearchResult>,
}

impl PatentPipeline {
    /// Assemble a pipeline around injected provider and resolver seams.
    pub fn new(
        config: AppConfig,
        provider: Arc<dyn SearchProvider>,
        resolver: Arc<dyn ProfileResolver>,
    ) -> Result<Self> {
        let retry = RetryPolicy::new(&config.retry);
        let executor = DiscoveryExecutor::new(Arc::clone(&provider), retry, &config.discovery);
        let navigator = FamilyNavigator::new(Arc::clone(&provider), &config.navigation)?;
        let office = PatentOfficeClient::from_config(&config)?;
        let registry = RegistryClient::from_config(&config)?;
        let results = TtlCache::new(Duration::from_secs(config.cache.result_ttl_secs));

        Ok(Self {
            config,
            provider,
            resolver,
            executor,
            navigator,
            office,
            registry,
            results,
        })
    }

    /// Assemble a pipeline with the bundled HTTP provider and resolver.
    ///
    /// Requires the search provider API key to be configured, via the
    /// config file or `PATFINDER_SERPAPI_KEY`.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let api_key = config.search.api_key.clone().ok_or_else(|| {
            PipelineError::Config(
                "search provider API key not configured, set PATFINDER_SERPAPI_KEY".to_string(),
            )
        })?;

        let provider = Arc::new(SerpApiProvider::new(api_key, &config.search)?);
        let resolver = Arc::new(ChemLookupResolver::new(
            config.chem.clone(),
            RetryPolicy::new(&config.retry),
        )?);

        Self::new(config, provider, resolver)
    }

    /// Run the full discovery pipeline for one molecule.
    ///
    /// Results are cached per `(molecule, deep_search)` pair; a cache hit
    /// returns the previous run's result without touching the network.
    pub async fn search(&self, molecule: &str, deep_search: bool) -> Result<SearchResult> {
        let molecule = molecule.trim();
        if molecule.is_empty() {
            return Err(PipelineError::InvalidInput(
                "molecule name must not be empty".to_string(),
            ));
        }

        let cache_key = format!("{molecule}_{deep_search}");
        if let Some(cached) = self.results.get(&cache_key) {
            tracing::info!("Returning cached result for {}", molecule);
            return Ok(cached);
        }

        let stats = StatsCollector::new();
        tracing::info!(
            "Starting patent search for {} (deep search: {})",
            molecule,
            deep_search
        );

        let stage_start = Instant::now();
        let profile = match self.resolver.resolve(molecule, &stats).await {
            Ok(profile) => profile,
            Err(e) => return Err(run_error("profile", &e, &stats)),
        };
        stats.record_stage(Stage::Profile, stage_start.elapsed());

        let stage_start = Instant::now();
        let wo_numbers = self.discover(&profile, &stats).await;
        stats.record_stage(Stage::Discovery, stage_start.elapsed());

        let stage_start = Instant::now();
        let fetcher = DetailFetcher::new(Arc::clone(&self.provider), &self.config.navigation);
        let mut families = Vec::new();
        let mut details = Vec::new();
        for wo in wo_numbers.iter().take(self.config.navigation.max_families) {
            let outcome = self.navigator.process(wo, &fetcher, &stats).await;
            families.push(outcome.record);
            details.extend(outcome.details);

            tokio::time::sleep(Duration::from_millis(
                self.config.navigation.delay_between_families_ms,
            ))
            .await;
        }
        stats.record_stage(Stage::Navigation, stage_start.elapsed());

        if let Some(office) = &self.office {
            if details.len() < self.config.office.backup_threshold && !wo_numbers.is_empty() {
                tracing::info!(
                    "Primary navigation found {} filings, running office backup",
                    details.len()
                );
                let stage_start = Instant::now();
                for (wo, ids) in office.backup_filings(&wo_numbers, &stats).await {
                    details.extend(fetcher.fetch_all(&ids, Some(&wo), &stats).await);
                }
                stats.record_stage(Stage::Office, stage_start.elapsed());
            }
        }

        let mut registry_filings = Vec::new();
        if deep_search {
            if let Some(registry) = &self.registry {
                let stage_start = Instant::now();
                registry_filings = registry
                    .deep_search(
                        molecule,
                        &profile.dev_codes,
                        profile.cas_number.as_deref(),
                        &stats,
                    )
                    .await;
                stats.record_stage(Stage::Registry, stage_start.elapsed());
            } else {
                tracing::debug!("Deep search requested but no registry endpoint is configured");
            }
        }

        let mut seen = HashSet::new();
        let filings: Vec<FilingDetail> = details
            .into_iter()
            .filter(|detail| seen.insert(detail.number.clone()))
            .collect();

        stats.finish();
        let result = SearchResult {
            molecule: molecule.to_string(),
            profile,
            wo_numbers,
            families,
            filings,
            registry_filings,
            stats: stats.snapshot(),
        };

        tracing::info!(
            "Search for {} complete: {} publications, {} families, {} filings",
            molecule,
            result.wo_numbers.len(),
            result.families.len(),
            result.filings.len()
        );
        self.results.insert(cache_key, result.clone());
        Ok(result)
    }

    /// Run the query plan and the one-shot structured pass, returning the
    /// discovered publications newest first.
    async fn discover(&self, profile: &MolecularProfile, stats: &StatsCollector) -> Vec<WoNumber> {
        let plan = build_query_plan(profile, &self.config.discovery);
        stats.add_queries_attempted(plan.len() as u64);
        tracing::info!(
            "Running {} discovery queries for {}",
            plan.len(),
            profile.name
        );

        let mut found = BTreeSet::new();
        for (i, query) in plan.iter().enumerate() {
            tracing::debug!("Discovery query {}/{}: {}", i + 1, plan.len(), query.text);
            let wos = self.executor.run_query(query, stats).await;
            if !wos.is_empty() {
                stats.record_query_success();
                found.extend(wos);
            }

            tokio::time::sleep(Duration::from_millis(
                self.config.discovery.delay_between_queries_ms,
            ))
            .await;
        }

        found.extend(self.executor.patent_engine_pass(&profile.name, stats).await);

        // Newest publications first
        let wo_numbers: Vec<WoNumber> = found.into_iter().rev().collect();
        stats.set_identifiers_found(wo_numbers.len() as u64);
        tracing::info!(
            "Discovered {} unique publications for {}",
            wo_numbers.len(),
            profile.name
        );
        wo_numbers
    }
}

/// Convert a stage failure into a run-level error that keeps the
/// statistics collected so far.
fn run_error(stage: &str, error: &dyn std::fmt::Display, stats: &StatsCollector) -> PipelineError {
    stats.finish();
    PipelineError::Run {
        stage: stage.to_string(),
        message: error.to_string(),
        stats: Box::new(stats.snapshot()),
    }
}
