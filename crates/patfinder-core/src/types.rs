//! Shared types used across the Patfinder application.
//!
//! This module defines common newtypes that provide type safety and clear
//! domain modeling for patent identifiers.

use crate::error::PatfinderError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Newtype for international (WO) publication numbers with validation.
///
/// Canonical form is `WO` followed by a four-digit year and a six-digit
/// serial, e.g. `WO2020123456`. Input is trimmed and uppercased before
/// validation, so `wo2020123456` is accepted and normalized.
///
/// Lexicographic order on the canonical form matches chronological order,
/// which is why this type derives `Ord`: sorting descending puts the most
/// recent publications first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WoNumber(String);

impl WoNumber {
    /// Create a new `WoNumber` from a string.
    ///
    /// # Errors
    /// Returns error if the value does not normalize to `WO` + 10 digits.
    pub fn new(number: impl Into<String>) -> Result<Self, PatfinderError> {
        let number = number.into().trim().to_uppercase();
        Self::validate(&number)?;
        Ok(Self(number))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Publication year portion of the number, e.g. `"2020"`.
    #[must_use]
    pub fn year(&self) -> &str {
        &self.0[2..6]
    }

    /// Validate canonical form: `WO` + 4-digit year + 6-digit serial.
    fn validate(number: &str) -> Result<(), PatfinderError> {
        static WO_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex =
            WO_REGEX.get_or_init(|| Regex::new(r"^WO\d{4}\d{6}$").expect("valid regex"));

        if regex.is_match(number) {
            Ok(())
        } else {
            Err(PatfinderError::Validation(format!(
                "invalid WO publication number: expected WO + 10 digits, got '{number}'"
            )))
        }
    }
}

impl fmt::Display for WoNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype for two-letter jurisdiction codes (`BR`, `US`, `EP`, ...).
///
/// Input is trimmed and uppercased before validation. Derives `Ord` so
/// jurisdiction-keyed maps iterate in a stable order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CountryCode(String);

impl CountryCode {
    /// Create a new `CountryCode` from a string.
    ///
    /// # Errors
    /// Returns error if the value is not exactly two ASCII letters.
    pub fn new(code: impl Into<String>) -> Result<Self, PatfinderError> {
        let code = code.into().trim().to_uppercase();
        Self::validate(&code)?;
        Ok(Self(code))
    }

    /// Extract the jurisdiction code from a document identifier prefix,
    /// e.g. `BR112015012345A2` yields `BR`. Returns `None` when the first
    /// two characters are not letters.
    #[must_use]
    pub fn from_doc_id(doc_id: &str) -> Option<Self> {
        let prefix = doc_id.get(..2)?;
        Self::new(prefix).ok()
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(code: &str) -> Result<(), PatfinderError> {
        static COUNTRY_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = COUNTRY_REGEX.get_or_init(|| Regex::new(r"^[A-Z]{2}$").expect("valid regex"));

        if regex.is_match(code) {
            Ok(())
        } else {
            Err(PatfinderError::Validation(format!(
                "invalid jurisdiction code: expected two letters, got '{code}'"
            )))
        }
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
