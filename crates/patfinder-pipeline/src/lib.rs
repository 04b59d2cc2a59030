//! Patfinder Pipeline - End-to-end patent discovery orchestration.
//!
//! Chains the Patfinder stages into one run: compound profile resolution,
//! multi-strategy publication discovery, family navigation with detail
//! fetching, a conditional patent-office backup, and an optional
//! national-registry deep search. Every run yields a [`SearchResult`] with
//! a full [`ExecutionStats`](patfinder_core::ExecutionStats) snapshot,
//! successful or not.
//!
//! # Stage Chain
//!
//! ```text
//! resolve profile -> plan queries -> discover publications
//!        -> navigate families -> fetch filing details
//!        -> office backup (when primary found too few)
//!        -> registry deep search (when requested)
//!        -> SearchResult + stats
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use patfinder_core::AppConfig;
//! use patfinder_pipeline::PatentPipeline;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load_with_env()?;
//! let pipeline = PatentPipeline::from_config(config)?;
//!
//! let result = pipeline.search("darolutamide", false).await?;
//! println!(
//!     "{} publications, {} filings",
//!     result.wo_numbers.len(),
//!     result.filings.len()
//! );
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod pipeline;
pub mod result;

// Re-export commonly used types
pub use error::{PipelineError, Result};
pub use pipeline::PatentPipeline;
pub use result::SearchResult;
