//! Structured compound profiles built from raw synonym lists.
//!
//! The synonym service returns a flat list of names for a compound.
//! Classification sorts them into development codes, registry (CAS)
//! numbers, and IUPAC-style systematic names, which later drive the
//! discovery query plan.

use once_cell::sync::Lazy;
use patfinder_core::ChemConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Development codes look like `ODM-201`, `BAY 1841788`, or `ASP9521`:
/// a short uppercase stem, optional separator, digits, optional suffix.
static DEV_CODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Z]{2,5}[-\s]?\d{3,7}[A-Z]?$")
        .expect("dev code regex is hardcoded and valid")
});

/// CAS registry numbers: 2-7 digits, 2 digits, check digit.
static CAS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2,7}-\d{2}-\d$").expect("CAS regex is hardcoded and valid"));

/// Substrings that mark a parenthesized synonym as systematic nomenclature.
const IUPAC_FRAGMENTS: &[&str] = &["yl", "methyl", "ethyl", "phenyl", "fluoro", "chloro"];

/// Identifiers known for a molecule, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MolecularProfile {
    /// Name the profile was resolved for
    pub name: String,
    /// Development codes, e.g. `ODM-201`
    pub dev_codes: Vec<String>,
    /// Primary CAS registry number, when one was found
    pub cas_number: Option<String>,
    /// Every CAS registry number seen in the synonym list
    pub all_cas_numbers: Vec<String>,
    /// IUPAC-style systematic names
    pub iupac_names: Vec<String>,
    /// Short synonyms kept for registry queries and display
    pub synonyms: Vec<String>,
}

impl MolecularProfile {
    /// Profile with a name and no identifiers, used when lookup fails.
    #[must_use]
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Classify a raw synonym list into a profile.
    ///
    /// Synonyms longer than 100 characters are ignored outright. Each
    /// remaining synonym may land in several buckets; the per-bucket caps
    /// come from `config`.
    #[must_use]
    pub fn from_synonyms(name: impl Into<String>, synonyms: &[String], config: &ChemConfig) -> Self {
        let mut dev_codes: Vec<String> = Vec::new();
        let mut cas_numbers: Vec<String> = Vec::new();
        let mut iupac_names: Vec<String> = Vec::new();
        let mut kept_synonyms: Vec<String> = Vec::new();

        for synonym in synonyms {
            if synonym.is_empty() || synonym.chars().count() > 100 {
                continue;
            }

            if DEV_CODE_PATTERN.is_match(synonym)
                && !dev_codes.iter().any(|c| c.eq_ignore_ascii_case(synonym))
                && dev_codes.len() < config.max_dev_codes
            {
                dev_codes.push(synonym.clone());
            }

            if CAS_PATTERN.is_match(synonym) && !cas_numbers.iter().any(|c| c == synonym) {
                cas_numbers.push(synonym.clone());
            }

            if looks_like_iupac(synonym) && iupac_names.len() < config.max_iupac_names {
                iupac_names.push(synonym.clone());
            }

            if synonym.chars().count() < config.max_synonym_length
                && kept_synonyms.len() < config.max_synonyms
            {
                kept_synonyms.push(synonym.clone());
            }
        }

        Self {
            name: name.into(),
            cas_number: cas_numbers.first().cloned(),
            dev_codes,
            all_cas_numbers: cas_numbers,
            iupac_names,
            synonyms: kept_synonyms,
        }
    }

    /// Whether the profile carries no identifiers beyond the bare name.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dev_codes.is_empty()
            && self.all_cas_numbers.is_empty()
            && self.iupac_names.is_empty()
            && self.synonyms.is_empty()
    }
}

/// Heuristic for systematic chemical names: parenthesized, reasonably
/// long, and containing at least one common nomenclature fragment.
fn looks_like_iupac(synonym: &str) -> bool {
    if !synonym.contains('(') || synonym.chars().count() <= 20 {
        return false;
    }
    let lower = synonym.to_lowercase();
    IUPAC_FRAGMENTS.iter().any(|fragment| lower.contains(fragment))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(synonyms: &[&str]) -> MolecularProfile {
        let owned: Vec<String> = synonyms.iter().map(|s| (*s).to_string()).collect();
        MolecularProfile::from_synonyms("darolutamide", &owned, &ChemConfig::default())
    }

    #[test]
    fn test_dev_codes_recognized() {
        let profile = classify(&["ODM-201", "BAY-1841788", "BAY 1841788", "ASP9521"]);
        assert_eq!(
            profile.dev_codes,
            vec!["ODM-201", "BAY-1841788", "BAY 1841788", "ASP9521"]
        );
    }

    #[test]
    fn test_dev_codes_case_insensitive() {
        let profile = classify(&["odm-201", "ODM-201", "Odm-201"]);
        assert_eq!(profile.dev_codes, vec!["odm-201"]);
    }

    #[test]
    fn test_dev_code_cap_respected() {
        let synonyms: Vec<String> = (0..30).map(|i| format!("AB-{:03}", 100 + i)).collect();
        let profile = MolecularProfile::from_synonyms(
            "test",
            &synonyms,
            &ChemConfig::default(),
        );
        assert_eq!(profile.dev_codes.len(), 15);
    }

    #[test]
    fn test_cas_numbers_recognized() {
        let profile = classify(&["1297538-32-9", "ODM-201", "50-78-2"]);
        assert_eq!(profile.cas_number.as_deref(), Some("1297538-32-9"));
        assert_eq!(profile.all_cas_numbers, vec!["1297538-32-9", "50-78-2"]);
    }

    #[test]
    fn test_cas_rejects_close_misses() {
        let profile = classify(&["1297538-32-91", "1-32-9x", "abc-12-3"]);
        assert!(profile.all_cas_numbers.is_empty());
        assert!(profile.cas_number.is_none());
    }

    #[test]
    fn test_iupac_heuristic() {
        let profile = classify(&[
            "N-((S)-1-(3-(3-chloro-4-cyanophenyl)-1H-pyrazol-1-yl)propan-2-yl)-5-methylamide",
            "(short name)",
            "a long synonym without parentheses that is not systematic at all",
        ]);
        assert_eq!(profile.iupac_names.len(), 1);
        assert!(profile.iupac_names[0].contains("chloro"));
    }

    #[test]
    fn test_long_synonyms_ignored() {
        let long = "x".repeat(150);
        let profile = classify(&[long.as_str(), "ODM-201"]);
        assert_eq!(profile.dev_codes, vec!["ODM-201"]);
        assert_eq!(profile.synonyms, vec!["ODM-201"]);
    }

    #[test]
    fn test_synonym_length_and_count_caps() {
        let config = ChemConfig::default();
        let too_long = "y".repeat(60);
        let mut synonyms: Vec<String> = (0..70).map(|i| format!("syn-{i}")).collect();
        synonyms.push(too_long);

        let profile = MolecularProfile::from_synonyms("test", &synonyms, &config);
        assert_eq!(profile.synonyms.len(), config.max_synonyms);
        assert!(profile.synonyms.iter().all(|s| s.chars().count() < 50));
    }

    #[test]
    fn test_empty_profile() {
        let profile = MolecularProfile::empty("darolutamide");
        assert_eq!(profile.name, "darolutamide");
        assert!(profile.is_empty());

        let populated = classify(&["ODM-201"]);
        assert!(!populated.is_empty());
    }
}
