//! Identifier extraction from arbitrary response payloads.
//!
//! Upstream responses change shape without notice, so extraction never
//! deserializes into fixed structs. International publication numbers are
//! scanned out of opaque text; national filing identifiers combine
//! structural field checks with text patterns via [`FilingMatcher`].

use crate::error::{Result, SearchError};
use once_cell::sync::Lazy;
use patfinder_core::WoNumber;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

/// Compact form with optional separators: `WO 2020 123456`, `WO-2020/123456`.
/// The trailing boundary rejects kind-coded forms like `WO2020123456A1`,
/// which only appear in structured fields handled separately.
static WO_COMPACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bWO[\s-]?(\d{4})[\s/-]?(\d{6})\b")
        .expect("WO compact regex is hardcoded and valid")
});

/// PCT application form: `PCT/IB2020/123456`.
static WO_PCT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bPCT/[A-Z]{2}(\d{4})/(\d{6})\b")
        .expect("PCT regex is hardcoded and valid")
});

/// Patent viewer URLs: `patents.google.com/patent/WO2020123456A1`.
static WO_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)patents\.google\.com/patent/WO(\d{4})(\d{6})")
        .expect("viewer URL regex is hardcoded and valid")
});

/// Anchored prefix form for structured publication-number fields, where a
/// kind code may trail the serial: `WO2011051540A1`.
static WO_PUBLICATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^WO[\s-]?(\d{4})[\s/-]?(\d{6})")
        .expect("publication number regex is hardcoded and valid")
});

/// Scan free text for international publication numbers.
///
/// All notations normalize to the canonical `WO` + 10 digits form, so the
/// same number written three ways yields one entry. Results preserve
/// document order and are deduplicated first-seen.
#[must_use]
pub fn extract_wo_numbers(text: &str) -> Vec<WoNumber> {
    let mut found: Vec<(usize, WoNumber)> = Vec::new();

    for pattern in [&*WO_COMPACT, &*WO_PCT, &*WO_URL] {
        for caps in pattern.captures_iter(text) {
            if let (Some(whole), Some(year), Some(serial)) =
                (caps.get(0), caps.get(1), caps.get(2))
            {
                if let Ok(wo) = WoNumber::new(format!("WO{}{}", year.as_str(), serial.as_str())) {
                    found.push((whole.start(), wo));
                }
            }
        }
    }

    found.sort_by_key(|(position, _)| *position);

    let mut seen = HashSet::new();
    found
        .into_iter()
        .filter_map(|(_, wo)| seen.insert(wo.clone()).then_some(wo))
        .collect()
}

/// Scan a full JSON payload for publication numbers by treating it as
/// opaque text, keys included.
#[must_use]
pub fn extract_wo_from_value(value: &Value) -> Vec<WoNumber> {
    extract_wo_numbers(&value.to_string())
}

/// Parse a structured publication-number field, tolerating a trailing
/// kind code.
#[must_use]
pub fn wo_from_publication_number(raw: &str) -> Option<WoNumber> {
    let caps = WO_PUBLICATION.captures(raw.trim())?;
    let (year, serial) = (caps.get(1)?, caps.get(2)?);
    WoNumber::new(format!("WO{}{}", year.as_str(), serial.as_str())).ok()
}

/// Structured-field names whose string values are filing candidates when
/// they start with the target prefix.
fn is_filing_key(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "country" | "pn" | "publication_number" | "document_id"
    )
}

/// Extracts national filing identifiers for one jurisdiction from
/// arbitrary JSON.
///
/// Two signals contribute candidates: values under known structured
/// field names that start with the prefix (kind codes kept), and
/// prefixed digit runs embedded anywhere in text. Candidates are
/// normalized (uppercased, non-alphanumerics stripped) and kept only
/// when they still start with the prefix and meet the minimum length.
pub struct FilingMatcher {
    prefix: String,
    min_length: usize,
    embedded: Regex,
}

impl FilingMatcher {
    /// Build a matcher for `prefix` (e.g. `BR`) with a minimum normalized
    /// identifier length.
    pub fn new(prefix: &str, min_length: usize) -> Result<Self> {
        let prefix = prefix.trim().to_uppercase();
        let escaped = regex::escape(&prefix);

        let embedded = Regex::new(&format!(r"(?i){escaped}[\s-]?(\d{{10,12}})"))
            .map_err(|e| SearchError::Internal(format!("invalid jurisdiction pattern: {e}")))?;

        Ok(Self {
            prefix,
            min_length,
            embedded,
        })
    }

    /// The jurisdiction prefix this matcher targets.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Normalize a candidate: uppercase, strip everything that is not
    /// alphanumeric, then check prefix and minimum length.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let cleaned: String = raw
            .to_uppercase()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect();

        (cleaned.starts_with(&self.prefix) && cleaned.len() >= self.min_length)
            .then_some(cleaned)
    }

    /// Collect normalized filing identifiers from a JSON payload,
    /// first-seen order, deduplicated.
    #[must_use]
    pub fn extract_from_value(&self, value: &Value) -> Vec<String> {
        let mut candidates: Vec<String> = Vec::new();

        visit_string_values(value, None, &mut |key, text| {
            if let Some(key) = key {
                if is_filing_key(key) && text.to_uppercase().starts_with(&self.prefix) {
                    candidates.push(text.to_string());
                }
            }

            for caps in self.embedded.captures_iter(text) {
                if let Some(digits) = caps.get(1) {
                    candidates.push(format!("{}{}", self.prefix, digits.as_str()));
                }
            }
        });

        let mut seen = HashSet::new();
        let mut filings = Vec::new();
        for candidate in candidates {
            if let Some(normalized) = self.normalize(&candidate) {
                if seen.insert(normalized.clone()) {
                    filings.push(normalized);
                }
            }
        }
        filings
    }
}

/// Visit every string value in a JSON tree with the key it sits under.
/// Array elements lose the parent key, matching how structured field
/// checks only apply to direct object members.
fn visit_string_values<'a, F>(value: &'a Value, key: Option<&'a str>, f: &mut F)
where
    F: FnMut(Option<&'a str>, &'a str),
{
    match value {
        Value::String(s) => f(key, s),
        Value::Array(items) => {
            for item in items {
                visit_string_values(item, None, f);
            }
        }
        Value::Object(map) => {
            for (child_key, child) in map {
                visit_string_values(child, Some(child_key.as_str()), f);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn numbers(text: &str) -> Vec<String> {
        extract_wo_numbers(text)
            .into_iter()
            .map(|wo| wo.as_str().to_string())
            .collect()
    }

    #[test]
    fn test_compact_forms() {
        assert_eq!(numbers("see WO2020123456 for details"), vec!["WO2020123456"]);
        assert_eq!(numbers("WO 2020 123456"), vec!["WO2020123456"]);
        assert_eq!(numbers("WO-2020/123456"), vec!["WO2020123456"]);
        assert_eq!(numbers("wo2020123456"), vec!["WO2020123456"]);
    }

    #[test]
    fn test_pct_form() {
        assert_eq!(numbers("PCT/IB2020/123456 pending"), vec!["WO2020123456"]);
    }

    #[test]
    fn test_viewer_url_form() {
        assert_eq!(
            numbers("https://patents.google.com/patent/WO2011051540A1/en"),
            vec!["WO2011051540"]
        );
    }

    #[test]
    fn test_embedded_and_viewer_link_forms_together() {
        let text = "claims priority to WO2011130690, full text at \
                    https://patents.google.com/patent/WO2018193946A1/en";
        assert_eq!(numbers(text), vec!["WO2011130690", "WO2018193946"]);
    }

    #[test]
    fn test_kind_code_needs_structured_field() {
        // Free-text scanning rejects kind-coded forms; the anchored
        // publication-number parser accepts them.
        assert!(numbers("WO2011051540A1").is_empty());
        let wo = wo_from_publication_number("WO2011051540A1").unwrap();
        assert_eq!(wo.as_str(), "WO2011051540");
        assert!(wo_from_publication_number("US2011051540A1").is_none());
    }

    #[test]
    fn test_same_number_in_three_notations_yields_one() {
        let text = "WO2020123456, PCT/IB2020/123456, patents.google.com/patent/WO2020123456A1";
        assert_eq!(numbers(text), vec!["WO2020123456"]);
    }

    #[test]
    fn test_document_order_preserved() {
        let text = "PCT/IB2021/000111 cites WO2019555444 and WO 2023 000999";
        assert_eq!(
            numbers(text),
            vec!["WO2021000111", "WO2019555444", "WO2023000999"]
        );
    }

    #[test]
    fn test_extraction_is_idempotent_on_own_output() {
        let first = numbers("WO-2020/123456 and PCT/EP2018/000777");
        let rejoined = first.join(" ");
        assert_eq!(numbers(&rejoined), first);
    }

    #[test]
    fn test_extract_from_json_payload() {
        let payload = json!({
            "organic_results": [
                {"title": "Androgen receptor modulators WO2011051540", "position": 1},
                {"snippet": "filed as PCT/FI2011/050847", "link": "https://example.com"}
            ],
            "search_metadata": {"status": "Success"}
        });
        let found = extract_wo_from_value(&payload);
        let found: Vec<&str> = found.iter().map(WoNumber::as_str).collect();
        assert_eq!(found, vec!["WO2011051540", "WO2011050847"]);
    }

    fn matcher() -> FilingMatcher {
        FilingMatcher::new("BR", 12).expect("build matcher")
    }

    #[test]
    fn test_filing_structured_key_keeps_kind_code() {
        // Spaced digit groups defeat the embedded pattern, so only the
        // structured-field signal fires here.
        let payload = json!({"publication_number": "BR 11 2015 012345 A2"});
        assert_eq!(matcher().extract_from_value(&payload), vec!["BR112015012345A2"]);
    }

    #[test]
    fn test_filing_structured_keys_recognized() {
        let payload = json!({
            "patents": [
                {"document_id": "BR 11 2012 023652 A2"},
                {"pn": "br 11 2019 000001 b1"},
                {"country": "BR"}
            ]
        });
        assert_eq!(
            matcher().extract_from_value(&payload),
            vec!["BR112012023652A2", "BR112019000001B1"]
        );
    }

    #[test]
    fn test_filing_embedded_in_text() {
        let payload = json!({
            "snippet": "family includes BR-112015012345 and later BR 112019000001 grants"
        });
        assert_eq!(
            matcher().extract_from_value(&payload),
            vec!["BR112015012345", "BR112019000001"]
        );
    }

    #[test]
    fn test_filing_unstructured_key_uses_embedded_signal_only() {
        let payload = json!({"result": "BR112015012345A2"});
        assert_eq!(matcher().extract_from_value(&payload), vec!["BR112015012345"]);
    }

    #[test]
    fn test_filing_minimum_length_enforced() {
        let payload = json!({"pn": "BR1234", "other": "BR12345678"});
        assert!(matcher().extract_from_value(&payload).is_empty());
    }

    #[test]
    fn test_filing_nested_country_object_not_a_candidate() {
        // Office responses wrap codes as {"$": "BR"}; the bare code must
        // not survive normalization.
        let payload = json!({
            "document-id": {"country": {"$": "BR"}, "doc-number": {"$": "112015012345"}}
        });
        assert!(matcher().extract_from_value(&payload).is_empty());
    }

    #[test]
    fn test_filing_dedup_first_seen() {
        let payload = json!({
            "a": "mentions BR112015012345 once",
            "b": "and br-112015012345 again",
            "c": ["BR 112015012345 in a list"]
        });
        assert_eq!(matcher().extract_from_value(&payload), vec!["BR112015012345"]);
    }
}
