//! Query plan generation.
//!
//! Turns a molecular profile into the ordered list of discovery queries.
//! Pure construction, no network: the executor decides how each query is
//! actually issued.

use patfinder_chem::MolecularProfile;
use patfinder_core::DiscoveryConfig;
use serde::{Deserialize, Serialize};

/// Which panel of the plan a query came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOrigin {
    /// Molecule name combined with a plausible publication year.
    YearBanded,
    /// Molecule name combined with a known assignee.
    Assignee,
    /// Development code from the profile.
    DevCode,
    /// Canonical registry number from the profile.
    Cas,
    /// Systematic chemical name from the profile.
    Iupac,
}

/// One discovery query, in plan order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Query text as sent to the provider.
    pub text: String,
    /// Panel that produced this query.
    pub origin: QueryOrigin,
}

impl SearchQuery {
    fn new(text: String, origin: QueryOrigin) -> Self {
        Self { text, origin }
    }
}

/// Build the ordered query plan for a profile.
///
/// Panels are emitted in a fixed order: year-banded, assignee, development
/// codes (two variants each), registry number, systematic names. The plan
/// is truncated to `max_queries` so a synonym-rich profile cannot flood
/// the provider.
#[must_use]
pub fn build_query_plan(profile: &MolecularProfile, config: &DiscoveryConfig) -> Vec<SearchQuery> {
    let name = profile.name.as_str();
    let mut plan = Vec::new();

    for year in &config.years {
        plan.push(SearchQuery::new(
            format!("{name} patent WO{year}"),
            QueryOrigin::YearBanded,
        ));
    }

    for assignee in &config.assignees {
        plan.push(SearchQuery::new(
            format!("{name} {assignee} patent"),
            QueryOrigin::Assignee,
        ));
    }

    for code in profile.dev_codes.iter().take(config.max_dev_code_queries) {
        plan.push(SearchQuery::new(
            format!("{code} patent WO"),
            QueryOrigin::DevCode,
        ));
        plan.push(SearchQuery::new(
            format!("{code} pharmaceutical patent"),
            QueryOrigin::DevCode,
        ));
    }

    if config.include_cas_query {
        if let Some(cas) = &profile.cas_number {
            plan.push(SearchQuery::new(format!("{cas} patent WO"), QueryOrigin::Cas));
        }
    }

    for iupac in profile.iupac_names.iter().take(config.max_iupac_queries) {
        plan.push(SearchQuery::new(
            format!("{iupac} patent"),
            QueryOrigin::Iupac,
        ));
    }

    plan.truncate(config.max_queries);
    plan
}
