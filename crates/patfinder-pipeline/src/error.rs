//! Pipeline-level error types.

use patfinder_chem::ChemError;
use patfinder_core::ExecutionStats;
use patfinder_family::FamilyError;
use patfinder_registry::RegistryError;
use patfinder_search::SearchError;
use thiserror::Error;

/// Errors surfaced by the pipeline itself.
///
/// Stage failures are absorbed into statistics wherever the run can
/// degrade; only failures the run cannot continue past reach this type.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Caller input was rejected before the run started
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The pipeline could not be assembled from configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Search provider construction or an unrecovered search failure
    #[error("search error: {0}")]
    Search(#[from] SearchError),

    /// Compound resolver construction failure
    #[error("chem error: {0}")]
    Chem(#[from] ChemError),

    /// Family navigation or office client construction failure
    #[error("family error: {0}")]
    Family(#[from] FamilyError),

    /// Registry client construction failure
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A stage failed in a way the run could not continue past.
    ///
    /// Carries the statistics collected up to the failure so callers can
    /// still see what the run did.
    #[error("pipeline stage {stage} failed: {message}")]
    Run {
        /// Stage that raised the failure
        stage: String,
        /// Failure description
        message: String,
        /// Statistics collected up to the failure
        stats: Box<ExecutionStats>,
    },
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
