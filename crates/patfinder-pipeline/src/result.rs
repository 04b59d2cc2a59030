//! Aggregated result of one pipeline run.

use patfinder_chem::MolecularProfile;
use patfinder_core::{ExecutionStats, WoNumber};
use patfinder_family::{FamilyRecord, FilingDetail};
use patfinder_registry::RegistryFiling;
use serde::{Deserialize, Serialize};

/// Everything one search run produced.
///
/// Cached per `(molecule, deep_search)` pair, so the struct is cheap to
/// clone relative to the network work it represents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Molecule name the run was started with
    pub molecule: String,
    /// Resolved compound profile
    pub profile: MolecularProfile,
    /// Discovered publications, newest first
    pub wo_numbers: Vec<WoNumber>,
    /// One record per navigated family
    pub families: Vec<FamilyRecord>,
    /// Filing details across all families, deduplicated by number
    pub filings: Vec<FilingDetail>,
    /// National-registry filings, present when deep search ran
    pub registry_filings: Vec<RegistryFiling>,
    /// Statistics snapshot for the run
    pub stats: ExecutionStats,
}
