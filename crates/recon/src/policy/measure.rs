use std::sync::Arc;

use serde_json::Value;

use crate::alias::{search, value_text, AliasSet};
use crate::error::ReconError;
use crate::model::{CanonicalRecord, FreeFormRecord, StructuredRecord};
use crate::units::{Bound, UnitTerms};

use super::FieldPolicy;

/// A length field reported in meters.
#[derive(Debug, Clone)]
pub struct MetersPolicy {
    aliases: AliasSet,
    bound: Option<Bound>,
    units: Arc<UnitTerms>,
}

impl MetersPolicy {
    pub fn new(aliases: AliasSet, bound: Option<Bound>, units: Arc<UnitTerms>) -> Self {
        Self {
            aliases,
            bound,
            units,
        }
    }

    fn convert(&self, value: &Value) -> Option<String> {
        let text = value_text(value)?;
        if value.is_array() {
            return Some(text);
        }
        match self.units.to_meters(&text, self.bound) {
            Some(meters) => Some(meters),
            None => {
                log::debug!("{}: no number in '{text}'", self.aliases.label());
                Some(text)
            }
        }
    }
}

impl FieldPolicy for MetersPolicy {
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
        let value = search(free_form, &self.aliases)
            .and_then(|v| self.convert(v))
            .or_else(|| structured.text(label));

        let mut out = CanonicalRecord::new();
        if let Some(value) = value {
            out.insert(label, value);
        }
        Ok(out)
    }
}
