use std::sync::OnceLock;

use regex::Regex;

use crate::alias::{search_text, AliasSet};
use crate::error::ReconError;
use crate::model::{CanonicalRecord, FreeFormRecord, StructuredRecord};

use super::{FieldPolicy, IdentifierRule};

/// Collector names and the record number, resolved together because the
/// model often glues the number onto the collector ("J. Smith 1423").
#[derive(Debug, Clone)]
pub struct CollectorPolicy {
    recorded_by: AliasSet,
    identified_by: AliasSet,
    record_number: IdentifierRule,
}

impl CollectorPolicy {
    pub fn new(recorded_by: AliasSet, identified_by: AliasSet, record_number: IdentifierRule) -> Self {
        Self {
            recorded_by,
            identified_by,
            record_number,
        }
    }
}

/// Split a trailing run of digits off a name.
pub fn split_suffix(name: &str) -> (String, Option<String>) {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    let suffix = SUFFIX.get_or_init(|| Regex::new(r"\s*(\d+)$").expect("valid regex"));

    match suffix.captures(name) {
        Some(caps) => {
            let head = name[..caps.get(0).map_or(name.len(), |m| m.start())].trim();
            let number = caps.get(1).map(|m| m.as_str().to_string());
            (head.to_string(), number)
        }
        None => (name.to_string(), None),
    }
}

impl FieldPolicy for CollectorPolicy {
    fn fields(&self) -> Vec<&str> {
        vec![
            self.recorded_by.label(),
            self.identified_by.label(),
            self.record_number.label(),
        ]
    }

    fn reconcile(
        &self,
        structured: &StructuredRecord,
        free_form: &FreeFormRecord,
        _text: &str,
    ) -> Result<CanonicalRecord, ReconError> {
        let mut out = CanonicalRecord::new();
        let mut number = self.record_number.resolve(structured, free_form);

        if let Some(names) = search_text(free_form, &self.recorded_by) {
            let (name, suffix) = split_suffix(&names);
            if !name.is_empty() {
                out.insert(self.recorded_by.label(), name);
            }
            if number.is_none() {
                number = suffix;
            }
        }

        if let Some(names) = search_text(free_form, &self.identified_by) {
            out.insert(self.identified_by.label(), names);
        }

        if let Some(number) = number {
            out.insert(self.record_number.label(), number);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn policy() -> CollectorPolicy {
        CollectorPolicy::new(
            AliasSet::new("dwc:recordedBy", &["dwc:collector", "dwc:collectors"]),
            AliasSet::new("dwc:identifiedBy", &["dwc:determinedBy"]),
            IdentifierRule::new(
                AliasSet::new("dwc:recordNumber", &["dwc:collectorNumber"]),
                "recordNumberIsLabeled".into(),
                Some(AliasSet::new("dwc:catalogNumber", &[] as &[&str])),
            ),
        )
    }

    fn run(structured: serde_json::Value, free_form: serde_json::Value) -> CanonicalRecord {
        let s = StructuredRecord::from_value(structured).unwrap();
        let f = FreeFormRecord::from_value(free_form).unwrap();
        policy().reconcile(&s, &f, "").unwrap()
    }

    #[test]
    fn numeric_suffix_becomes_record_number() {
        let out = run(json!({}), json!({"dwc:recordedBy": "J. Smith 1423"}));
        assert_eq!(out.get("dwc:recordedBy"), Some("J. Smith"));
        assert_eq!(out.get("dwc:recordNumber"), Some("1423"));
    }

    #[test]
    fn resolved_record_number_keeps_priority() {
        let out = run(
            json!({"dwc:recordNumber": "88", "recordNumberIsLabeled": "yes"}),
            json!({"dwc:collector": "J. Smith 1423"}),
        );
        assert_eq!(out.get("dwc:recordedBy"), Some("J. Smith"));
        assert_eq!(out.get("dwc:recordNumber"), Some("88"));
    }

    #[test]
    fn collector_lists_are_flattened() {
        let out = run(
            json!({}),
            json!({
                "dwc:collectors": ["J. Smith", 7, "A. Jones"],
                "dwc:determinedBy": "R. Brown"
            }),
        );
        assert_eq!(out.get("dwc:recordedBy"), Some("J. Smith | A. Jones"));
        assert_eq!(out.get("dwc:identifiedBy"), Some("R. Brown"));
        assert!(!out.contains_key("dwc:recordNumber"));
    }

    #[test]
    fn bare_number_is_not_a_name() {
        let out = run(json!({}), json!({"dwc:recordedBy": "1423"}));
        assert!(!out.contains_key("dwc:recordedBy"));
        assert_eq!(out.get("dwc:recordNumber"), Some("1423"));
    }

    #[test]
    fn split_suffix_cases() {
        assert_eq!(split_suffix("J. Smith"), ("J. Smith".into(), None));
        assert_eq!(split_suffix("J. Smith  s.n."), ("J. Smith  s.n.".into(), None));
        assert_eq!(
            split_suffix("Smith & Jones 12"),
            ("Smith & Jones".into(), Some("12".into()))
        );
    }
}
