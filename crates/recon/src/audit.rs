//! Key audit of language-model output.
//!
//! Compares the model's raw output with its hand-cleaned JSON and classifies
//! every key: Darwin Core terms are good, anything else is a bad term, and a
//! bad term that some field policy would repair anyway is a fixed term.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use crate::darwin_core::{clean_key, is_core_term};
use crate::error::{Origin, ReconError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelAudit {
    pub stem: String,
    /// No cleaned file exists for this label.
    pub missing_file: bool,
    /// The cleaned file differs from the raw model output.
    pub bad_json: bool,
    pub terms: Vec<String>,
    pub bad_terms: Vec<String>,
    pub fixed_terms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub total_labels: usize,
    pub missing_files: usize,
    pub bad_json_files: usize,
    pub labels_with_bad_terms: usize,
    pub labels_with_bad_json_and_bad_terms: usize,
    pub labels_with_fixed_terms: usize,
    pub terms: usize,
    pub bad_terms: usize,
    pub fixed_terms: usize,
}

pub fn audit_label(
    stem: &str,
    raw_text: &str,
    clean_text: Option<&str>,
    fixable: &BTreeSet<String>,
) -> Result<LabelAudit, ReconError> {
    let mut audit = LabelAudit {
        stem: stem.to_string(),
        ..LabelAudit::default()
    };

    let Some(clean_text) = clean_text else {
        audit.missing_file = true;
        return Ok(audit);
    };
    audit.bad_json = raw_text != clean_text;

    let invalid = |message: String| ReconError::InvalidRecord {
        origin: Origin::FreeForm,
        message: format!("{stem}: {message}"),
    };
    let value: Value = serde_json::from_str(clean_text).map_err(|e| invalid(e.to_string()))?;
    let Value::Object(entries) = value else {
        return Err(invalid("cleaned output is not a JSON object".into()));
    };

    for key in entries.keys() {
        let key = clean_key(key);
        if !is_core_term(&key) {
            if fixable.contains(&key) {
                audit.fixed_terms.push(key.clone());
            }
            audit.bad_terms.push(key.clone());
        }
        audit.terms.push(key);
    }

    Ok(audit)
}

pub fn summarize(audits: &[LabelAudit]) -> AuditSummary {
    let mut summary = AuditSummary {
        total_labels: audits.len(),
        ..AuditSummary::default()
    };

    for audit in audits {
        let has_bad = !audit.bad_terms.is_empty();
        summary.missing_files += usize::from(audit.missing_file);
        summary.bad_json_files += usize::from(audit.bad_json);
        summary.labels_with_bad_terms += usize::from(has_bad);
        summary.labels_with_bad_json_and_bad_terms += usize::from(audit.bad_json && has_bad);
        summary.labels_with_fixed_terms += usize::from(!audit.fixed_terms.is_empty());
        summary.terms += audit.terms.len();
        summary.bad_terms += audit.bad_terms.len();
        summary.fixed_terms += audit.fixed_terms.len();
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixable() -> BTreeSet<String> {
        ["dwc:collectionDate", "dwc:elevation"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn missing_clean_file() {
        let audit = audit_label("a", "{}", None, &fixable()).unwrap();
        assert!(audit.missing_file);
        assert!(audit.terms.is_empty());
    }

    #[test]
    fn classifies_terms() {
        let raw = r#"```json {"Country": "Peru"} ```"#;
        let clean = r#"{"Country": "Peru", "collectionDate": "1998", "dwc:favoriteColor": "red"}"#;
        let audit = audit_label("a", raw, Some(clean), &fixable()).unwrap();
        assert!(audit.bad_json);
        assert_eq!(
            audit.terms,
            ["dwc:country", "dwc:collectionDate", "dwc:favoriteColor"]
        );
        assert_eq!(audit.bad_terms, ["dwc:collectionDate", "dwc:favoriteColor"]);
        assert_eq!(audit.fixed_terms, ["dwc:collectionDate"]);
    }

    #[test]
    fn identical_text_is_good_json() {
        let text = r#"{"dwc:country": "Peru"}"#;
        let audit = audit_label("a", text, Some(text), &fixable()).unwrap();
        assert!(!audit.bad_json);
        assert!(audit.bad_terms.is_empty());
    }

    #[test]
    fn cleaned_text_must_be_an_object() {
        let err = audit_label("a", "[]", Some("[]"), &fixable()).unwrap_err();
        assert_eq!(err.kind(), "invalid_record");
        assert!(err.to_string().contains("a: cleaned output is not a JSON object"));
    }

    #[test]
    fn summary_counts() {
        let f = fixable();
        let audits = vec![
            audit_label("a", "x", Some(r#"{"elevation": "3 m"}"#), &f).unwrap(),
            audit_label("b", "{}", Some("{}"), &f).unwrap(),
            audit_label("c", "{}", None, &f).unwrap(),
            audit_label("d", r#"{"habitat": "bog"}"#, Some(r#"{"habitat": "bog"}"#), &f).unwrap(),
        ];
        let summary = summarize(&audits);
        assert_eq!(summary.total_labels, 4);
        assert_eq!(summary.missing_files, 1);
        assert_eq!(summary.bad_json_files, 1);
        assert_eq!(summary.labels_with_bad_terms, 1);
        assert_eq!(summary.labels_with_bad_json_and_bad_terms, 1);
        assert_eq!(summary.labels_with_fixed_terms, 1);
        assert_eq!(summary.terms, 2);
        assert_eq!(summary.bad_terms, 1);
        assert_eq!(summary.fixed_terms, 1);
    }
}
