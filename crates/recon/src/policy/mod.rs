//! Field policies: one stateless object per canonical field (or bundle of
//! fields), built once from the field table and shared across workers.

mod agreement;
mod collector;
mod identifier;
mod measure;
mod source;

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{Bundle, ReconConfig, Strategy};
use crate::date::DateReconciler;
use crate::error::ReconError;
use crate::model::{CanonicalRecord, FreeFormRecord, StructuredRecord};
use crate::units::UnitTerms;

pub use agreement::AgreementPolicy;
pub use collector::{split_suffix, CollectorPolicy};
pub use identifier::{IdentifierPolicy, IdentifierRule};
pub use measure::MetersPolicy;
pub use source::{SourceOrder, SourcePolicy};

/// The single capability every field policy has.
pub trait FieldPolicy: Send + Sync {
    /// Canonical fields this policy may write, and no others.
    fn fields(&self) -> Vec<&str>;

    /// Partial canonical record for this policy's fields.
    fn reconcile(
        &self,
        structured: &StructuredRecord,
        free_form: &FreeFormRecord,
        text: &str,
    ) -> Result<CanonicalRecord, ReconError>;
}

/// Build the ordered policy registry from a validated field table.
///
/// Bundled strategies produce one policy, placed where the bundle's first
/// member appears. Every canonical field ends up with exactly one owner.
pub fn build_registry(
    config: &ReconConfig,
    units: &Arc<UnitTerms>,
) -> Result<Vec<Box<dyn FieldPolicy>>, ReconError> {
    let mut policies: Vec<Box<dyn FieldPolicy>> = Vec::new();
    let mut built_bundles: Vec<Bundle> = Vec::new();

    for field in &config.fields {
        if let Some(bundle) = field.strategy.bundle() {
            if built_bundles.contains(&bundle) {
                continue;
            }
            built_bundles.push(bundle);
            policies.push(bundle_policy(config, bundle)?);
            continue;
        }

        let aliases = field.aliases();
        let label = field.label.clone();
        let policy: Box<dyn FieldPolicy> = match field.strategy {
            Strategy::FreeForm => Box::new(SourcePolicy::new(
                aliases,
                SourceOrder::FreeFormOnly,
                field.wildcard.clone(),
            )),
            Strategy::FreeFormThenStructured => Box::new(SourcePolicy::new(
                aliases,
                SourceOrder::FreeFormFirst,
                field.wildcard.clone(),
            )),
            Strategy::StructuredFirst => Box::new(SourcePolicy::new(
                aliases,
                SourceOrder::StructuredFirst,
                field.wildcard.clone(),
            )),
            Strategy::LabeledIdentifier => Box::new(IdentifierPolicy::new(IdentifierRule::new(
                aliases,
                field.labeled_key(),
                field.confirm_aliases(),
            ))),
            Strategy::Agreement => Box::new(AgreementPolicy::new(aliases)),
            Strategy::Meters => Box::new(MetersPolicy::new(aliases, field.bound, Arc::clone(units))),
            other => {
                return Err(ReconError::ConfigValidation(format!(
                    "field '{label}': strategy '{other}' has no policy"
                )))
            }
        };
        policies.push(policy);
    }

    check_ownership(&policies)?;
    log::debug!("built {} field policies", policies.len());
    Ok(policies)
}

fn bundle_policy(config: &ReconConfig, bundle: Bundle) -> Result<Box<dyn FieldPolicy>, ReconError> {
    let member = |strategy: Strategy| {
        config.field_with(strategy).ok_or_else(|| {
            ReconError::ConfigValidation(format!(
                "{bundle} bundle is incomplete: missing {strategy}"
            ))
        })
    };

    match bundle {
        Bundle::Collector => {
            let recorded_by = member(Strategy::RecordedBy)?;
            let identified_by = member(Strategy::IdentifiedBy)?;
            let number = member(Strategy::RecordNumber)?;
            Ok(Box::new(CollectorPolicy::new(
                recorded_by.aliases(),
                identified_by.aliases(),
                IdentifierRule::new(number.aliases(), number.labeled_key(), number.confirm_aliases()),
            )))
        }
        Bundle::Date => {
            let date = member(Strategy::EventDate)?;
            let verbatim = member(Strategy::VerbatimEventDate)?;
            Ok(Box::new(DateReconciler::new(date.aliases(), &verbatim.label)))
        }
    }
}

fn check_ownership(policies: &[Box<dyn FieldPolicy>]) -> Result<(), ReconError> {
    let mut owners: HashMap<&str, usize> = HashMap::new();
    for (i, policy) in policies.iter().enumerate() {
        for field in policy.fields() {
            if let Some(prev) = owners.insert(field, i) {
                return Err(ReconError::ConfigValidation(format!(
                    "field '{field}' is owned by policies {prev} and {i}"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(input: &str) -> Vec<Box<dyn FieldPolicy>> {
        let config = ReconConfig::from_toml(input).unwrap();
        build_registry(&config, &UnitTerms::builtin().unwrap()).unwrap()
    }

    #[test]
    fn builtin_registry_owns_every_field_once() {
        let config = ReconConfig::builtin().unwrap();
        let policies = build_registry(&config, &UnitTerms::builtin().unwrap()).unwrap();

        let mut owned: Vec<&str> = policies.iter().flat_map(|p| p.fields()).collect();
        owned.sort_unstable();
        let mut labels: Vec<&str> = config.fields.iter().map(|f| f.label.as_str()).collect();
        labels.sort_unstable();
        assert_eq!(owned, labels);

        // collector and date bundles collapse into one policy each
        assert_eq!(policies.len(), config.fields.len() - 3);
    }

    #[test]
    fn bundle_is_placed_at_first_member() {
        let policies = registry(
            r#"
[[field]]
label = "dwc:verbatimEventDate"
strategy = "verbatim_event_date"

[[field]]
label = "dwc:habitat"
strategy = "free_form"

[[field]]
label = "dwc:eventDate"
strategy = "event_date"
"#,
        );
        assert_eq!(policies.len(), 2);
        assert_eq!(
            policies[0].fields(),
            ["dwc:eventDate", "dwc:verbatimEventDate"]
        );
        assert_eq!(policies[1].fields(), ["dwc:habitat"]);
    }

    #[test]
    fn duplicate_owner_is_rejected() {
        let config = ReconConfig {
            clean_keys: true,
            fields: ReconConfig::from_toml(
                r#"
[[field]]
label = "dwc:habitat"
strategy = "free_form"
"#,
            )
            .unwrap()
            .fields
            .iter()
            .cycle()
            .take(2)
            .cloned()
            .collect(),
        };
        let err = match build_registry(&config, &UnitTerms::builtin().unwrap()) {
            Ok(_) => panic!("expected ownership error"),
            Err(e) => e,
        };
        assert!(err.to_string().contains("'dwc:habitat' is owned by policies 0 and 1"));
    }
}
