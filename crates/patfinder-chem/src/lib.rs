//! Patfinder Chem - Compound identity resolution.
//!
//! Resolves a molecule name into a [`MolecularProfile`]: development
//! codes, CAS registry numbers, IUPAC names, and short synonyms, all
//! classified from the raw synonym list of a PubChem-compatible service.
//! The profile feeds the discovery query plan downstream.
//!
//! # Example
//!
//! ```rust
//! use patfinder_chem::MolecularProfile;
//! use patfinder_core::ChemConfig;
//!
//! let synonyms = vec!["ODM-201".to_string(), "1297538-32-9".to_string()];
//! let profile =
//!     MolecularProfile::from_synonyms("darolutamide", &synonyms, &ChemConfig::default());
//! assert_eq!(profile.dev_codes, vec!["ODM-201"]);
//! assert_eq!(profile.cas_number.as_deref(), Some("1297538-32-9"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod profile;
pub mod resolver;

// Re-export commonly used types
pub use error::{ChemError, Result};
pub use profile::MolecularProfile;
pub use resolver::{ChemLookupResolver, ProfileResolver};
