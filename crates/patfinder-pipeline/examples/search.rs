//! Run the patent discovery pipeline from the command line.
//!
//! ```text
//! PATFINDER_SERPAPI_KEY=... cargo run -p patfinder-pipeline --example search -- darolutamide
//! PATFINDER_SERPAPI_KEY=... cargo run -p patfinder-pipeline --example search -- darolutamide --deep
//! ```

use anyhow::Result;
use patfinder_core::AppConfig;
use patfinder_pipeline::PatentPipeline;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,patfinder=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    let molecule = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "darolutamide".to_string());
    let deep_search = std::env::args().any(|arg| arg == "--deep");

    let config = AppConfig::load_with_env()?;
    let pipeline = PatentPipeline::from_config(config)?;
    let result = pipeline.search(&molecule, deep_search).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
