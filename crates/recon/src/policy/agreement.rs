use crate::alias::{search_text, AliasSet};
use crate::error::ReconError;
use crate::model::{CanonicalRecord, FreeFormRecord, StructuredRecord};

use super::FieldPolicy;

/// Accept the model's answer only when the rule extractor agrees with it.
#[derive(Debug, Clone)]
pub struct AgreementPolicy {
    aliases: AliasSet,
}

impl AgreementPolicy {
    pub fn new(aliases: AliasSet) -> Self {
        Self { aliases }
    }
}

impl FieldPolicy for AgreementPolicy {
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
        let rule = structured.text(label);
        let model = search_text(free_form, &self.aliases);

        let value = match (rule, model) {
            (Some(rule), Some(model)) => {
                if rule.to_lowercase().contains(&model.to_lowercase()) {
                    Some(model)
                } else {
                    Some(rule)
                }
            }
            (rule, model) => rule.or(model),
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

    fn run(structured: serde_json::Value, free_form: serde_json::Value) -> Option<String> {
        let policy = AgreementPolicy::new(AliasSet::new("dwc:sex", &["sex"]));
        let s = StructuredRecord::from_value(structured).unwrap();
        let f = FreeFormRecord::from_value(free_form).unwrap();
        let out = policy.reconcile(&s, &f, "").unwrap();
        out.get("dwc:sex").map(str::to_string)
    }

    #[test]
    fn disagreement_keeps_structured() {
        assert_eq!(
            run(json!({"dwc:sex": "female"}), json!({"sex": "female, lactating"})).as_deref(),
            Some("female")
        );
    }

    #[test]
    fn contained_model_value_wins() {
        assert_eq!(
            run(json!({"dwc:sex": "Female, lactating"}), json!({"dwc:sex": "female"})).as_deref(),
            Some("female")
        );
    }

    #[test]
    fn single_source() {
        assert_eq!(run(json!({}), json!({"sex": "male"})).as_deref(), Some("male"));
        assert_eq!(run(json!({"dwc:sex": "male"}), json!({})).as_deref(), Some("male"));
        assert_eq!(run(json!({}), json!({"sex": "not provided"})), None);
    }
}
