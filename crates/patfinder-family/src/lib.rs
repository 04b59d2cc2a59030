//! Patfinder Family - Patent family navigation.
//!
//! Walks each discovered WO publication through the provider's result
//! pages to its worldwide family, buckets family members by jurisdiction,
//! and fetches per-filing detail records under a shared budget. A patent
//! office client backs up the provider path when primary navigation finds
//! too few target-jurisdiction filings.
//!
//! # Navigation
//!
//! Each publication is processed in three hops:
//!
//! ```text
//! patent_search(WO)          resolve the publication's result page
//!   -> json_endpoint         continuation link into the slower index
//!   -> serpapi_link          family detail page, credentialed fetch
//!   -> worldwide_applications  filings bucketed per jurisdiction
//! ```
//!
//! A missing link at any hop ends navigation for that family with a
//! status describing how far it got; only transport and provider errors
//! surface as [`FamilyStatus::Error`] records.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod details;
pub mod error;
pub mod navigator;
pub mod office;

// Re-export commonly used types
pub use details::{DetailFetcher, FilingDetail};
pub use error::{FamilyError, Result};
pub use navigator::{FamilyNavigator, FamilyRecord, FamilyStatus, NavigationOutcome};
pub use office::PatentOfficeClient;
