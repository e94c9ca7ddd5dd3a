use crate::alias::{search_text, value_text, wildcard, AliasSet};
use crate::error::ReconError;
use crate::model::{CanonicalRecord, FreeFormRecord, StructuredRecord};

use super::FieldPolicy;

/// Which extractor is asked first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrder {
    /// Free-form value or nothing.
    FreeFormOnly,
    /// Free-form value, else the structured value.
    FreeFormFirst,
    /// Structured value, else the free-form value.
    StructuredFirst,
}

/// Source-order resolution for plain text fields.
#[derive(Debug, Clone)]
pub struct SourcePolicy {
    aliases: AliasSet,
    order: SourceOrder,
    wildcard: Option<String>,
}

impl SourcePolicy {
    pub fn new(aliases: AliasSet, order: SourceOrder, wildcard: Option<String>) -> Self {
        Self {
            aliases,
            order,
            wildcard,
        }
    }

    fn free_form_text(&self, free_form: &FreeFormRecord) -> Option<String> {
        search_text(free_form, &self.aliases).or_else(|| {
            let pattern = self.wildcard.as_deref()?;
            wildcard(free_form, pattern).and_then(value_text)
        })
    }
}

impl FieldPolicy for SourcePolicy {
    fn fields(&self) -> Vec<&str> {
        vec![self.aliases.label()]
    }

    fn reconcile(
        &self,
        structured: &StructuredRecord,
        free_form: &FreeFormRecord,
        _text: &str,
    ) -> Result<CanonicalRecord, ReconError> {
        let label = self.aliases.label();
        let value = match self.order {
            SourceOrder::FreeFormOnly => self.free_form_text(free_form),
            SourceOrder::FreeFormFirst => self
                .free_form_text(free_form)
                .or_else(|| structured.text(label)),
            SourceOrder::StructuredFirst => structured
                .text(label)
                .or_else(|| self.free_form_text(free_form)),
        };

        let mut out = CanonicalRecord::new();
        if let Some(value) = value {
            out.insert(label, value);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(structured: serde_json::Value, free_form: serde_json::Value) -> (StructuredRecord, FreeFormRecord) {
        (
            StructuredRecord::from_value(structured).unwrap(),
            FreeFormRecord::from_value(free_form).unwrap(),
        )
    }

    #[test]
    fn free_form_only_omits_missing_field() {
        let policy = SourcePolicy::new(
            AliasSet::new("dwc:habitat", &[] as &[&str]),
            SourceOrder::FreeFormOnly,
            None,
        );
        let (s, f) = records(json!({"dwc:habitat": "bog"}), json!({"dwc:country": "Peru"}));
        assert!(policy.reconcile(&s, &f, "").unwrap().is_empty());

        let (s, f) = records(json!({}), json!({"DWC:Habitat": "bog edge"}));
        let out = policy.reconcile(&s, &f, "").unwrap();
        assert_eq!(out.get("dwc:habitat"), Some("bog edge"));
    }

    #[test]
    fn synonym_is_normalized_to_label() {
        let policy = SourcePolicy::new(
            AliasSet::new("dwc:associatedTaxa", &["dwc:associatedSpecies"]),
            SourceOrder::FreeFormOnly,
            None,
        );
        let (s, f) = records(
            json!({}),
            json!({"dwc:associatedSpecies": ["Quercus alba", "Acer rubrum"]}),
        );
        let out = policy.reconcile(&s, &f, "").unwrap();
        assert_eq!(out.get("dwc:associatedTaxa"), Some("Quercus alba | Acer rubrum"));
        assert!(!out.contains_key("dwc:associatedSpecies"));
    }

    #[test]
    fn free_form_first_falls_back_to_structured() {
        let policy = SourcePolicy::new(
            AliasSet::new("dwc:geodeticDatum", &["dwc:datum"]),
            SourceOrder::FreeFormFirst,
            None,
        );
        let (s, f) = records(json!({"dwc:geodeticDatum": "WGS84"}), json!({"dwc:datum": "none"}));
        let out = policy.reconcile(&s, &f, "").unwrap();
        assert_eq!(out.get("dwc:geodeticDatum"), Some("WGS84"));

        let (s, f) = records(json!({"dwc:geodeticDatum": "WGS84"}), json!({"dwc:datum": "NAD27"}));
        let out = policy.reconcile(&s, &f, "").unwrap();
        assert_eq!(out.get("dwc:geodeticDatum"), Some("NAD27"));
    }

    #[test]
    fn structured_first_prefers_rule_value() {
        let policy = SourcePolicy::new(
            AliasSet::new("dwc:scientificNameAuthorship", &["dwc:scientificNameAuthor"]),
            SourceOrder::StructuredFirst,
            None,
        );
        let (s, f) = records(
            json!({"dwc:scientificNameAuthorship": "L."}),
            json!({"dwc:scientificNameAuthor": "Linnaeus"}),
        );
        let out = policy.reconcile(&s, &f, "").unwrap();
        assert_eq!(out.get("dwc:scientificNameAuthorship"), Some("L."));

        let (s, f) = records(json!({}), json!({"dwc:scientificNameAuthor": "Linnaeus"}));
        let out = policy.reconcile(&s, &f, "").unwrap();
        assert_eq!(out.get("dwc:scientificNameAuthorship"), Some("Linnaeus"));
    }

    #[test]
    fn wildcard_before_structured_fallback() {
        let policy = SourcePolicy::new(
            AliasSet::new("dwc:locality", &["dwc:location"]),
            SourceOrder::FreeFormFirst,
            Some("locality".into()),
        );
        let (s, f) = records(
            json!({"dwc:locality": "from rules"}),
            json!({"dwc:nearestLocalityName": "3 km N of Cuzco"}),
        );
        let out = policy.reconcile(&s, &f, "").unwrap();
        assert_eq!(out.get("dwc:locality"), Some("3 km N of Cuzco"));

        // placeholder earlier in the record stops the wildcard scan
        let (s, f) = records(
            json!({"dwc:locality": "from rules"}),
            json!({"dwc:county": "not specified", "dwc:nearestLocalityName": "3 km N of Cuzco"}),
        );
        let out = policy.reconcile(&s, &f, "").unwrap();
        assert_eq!(out.get("dwc:locality"), Some("from rules"));
    }
}
