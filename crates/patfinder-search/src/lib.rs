//! Patfinder Search - patent discovery through pluggable search providers.
//!
//! This crate turns a molecular profile into discovery queries, executes
//! them through a search provider with fallbacks, and extracts patent
//! identifiers from whatever shape the responses come back in.
//!
//! # Features
//!
//! - **Provider Abstraction**: Unified trait over search backends
//! - **Query Planning**: Deterministic, bounded query panels per profile
//! - **Multi-Strategy Execution**: Primary provider with direct-fetch fallback
//! - **Schema-Tolerant Extraction**: Pattern matching over arbitrary JSON
//!
//! # Example
//!
//! ```rust
//! use patfinder_chem::MolecularProfile;
//! use patfinder_core::DiscoveryConfig;
//! use patfinder_search::build_query_plan;
//!
//! let profile = MolecularProfile::empty("darolutamide");
//! let plan = build_query_plan(&profile, &DiscoveryConfig::default());
//!
//! // Year-banded and assignee panels need only the molecule name.
//! assert_eq!(plan.len(), 14);
//! assert!(plan[0].text.contains("darolutamide"));
//! ```
//!
//! # Strategy Chain
//!
//! Each query walks the configured strategy chain until one strategy
//! yields at least one identifier:
//!
//! ```text
//! SearchQuery → provider (keyword engine) → extractor → identifiers
//!                   ↓ empty or error
//!               direct_fetch (plain web search) → extractor → identifiers
//! ```
//!
//! Strategy failures are logged and counted, never propagated: a query
//! that yields nothing is a normal outcome of discovery.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod executor;
pub mod extract;
pub mod plan;
pub mod provider;
pub mod providers;

// Re-export commonly used types
pub use error::{Result, SearchError};
pub use executor::DiscoveryExecutor;
pub use extract::{
    extract_wo_from_value, extract_wo_numbers, wo_from_publication_number, FilingMatcher,
};
pub use plan::{build_query_plan, QueryOrigin, SearchQuery};
pub use provider::SearchProvider;
pub use providers::SerpApiProvider;
