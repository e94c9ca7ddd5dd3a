use crate::alias::{search_text, AliasSet};
use crate::error::ReconError;
use crate::model::{CanonicalRecord, FreeFormRecord, StructuredRecord};

use super::FieldPolicy;

/// Trust the rule extractor for an identifier only when it is sure.
///
/// The structured value wins when it was explicitly labeled on the specimen
/// and is a single value, or when the model reported the same value under a
/// confirming key (a catalog number read as a record number, say). Otherwise
/// the free-form value is used.
#[derive(Debug, Clone)]
pub struct IdentifierRule {
    aliases: AliasSet,
    labeled_key: String,
    confirm: Option<AliasSet>,
}

impl IdentifierRule {
    pub fn new(aliases: AliasSet, labeled_key: String, confirm: Option<AliasSet>) -> Self {
        Self {
            aliases,
            labeled_key,
            confirm,
        }
    }

    pub fn label(&self) -> &str {
        self.aliases.label()
    }

    pub fn resolve(&self, structured: &StructuredRecord, free_form: &FreeFormRecord) -> Option<String> {
        let label = self.label();

        if let Some(value) = structured.text(label) {
            if structured.is_labeled(label, &self.labeled_key)
                && structured.cardinality(label) == 1
            {
                return Some(value);
            }
            if let Some(confirm) = &self.confirm {
                if search_text(free_form, confirm).as_deref() == Some(value.as_str()) {
                    log::debug!("{label}: structured value confirmed by {}", confirm.label());
                    return Some(value);
                }
            }
        }

        search_text(free_form, &self.aliases)
    }
}

/// A stand-alone identifier field (accession number, recordedByID).
#[derive(Debug, Clone)]
pub struct IdentifierPolicy {
    rule: IdentifierRule,
}

impl IdentifierPolicy {
    pub fn new(rule: IdentifierRule) -> Self {
        Self { rule }
    }
}

impl FieldPolicy for IdentifierPolicy {
    fn fields(&self) -> Vec<&str> {
        vec![self.rule.label()]
    }

    fn reconcile(
        &self,
        structured: &StructuredRecord,
        free_form: &FreeFormRecord,
        _text: &str,
    ) -> Result<CanonicalRecord, ReconError> {
        let mut out = CanonicalRecord::new();
        if let Some(value) = self.rule.resolve(structured, free_form) {
            out.insert(self.rule.label(), value);
        }
        Ok(out)
    }
}
