use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use crate::alias::AliasIndex;
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::model::{CanonicalRecord, FreeFormRecord, LabelInput, LabelOutcome, StructuredRecord};
use crate::policy::{build_registry, FieldPolicy};
use crate::units::UnitTerms;

/// Runs every field policy over one label and unions the results.
///
/// Immutable once built; share one instance across worker threads.
pub struct Reconciler {
    config: ReconConfig,
    policies: Vec<Box<dyn FieldPolicy>>,
    aliases: AliasIndex,
}

impl Reconciler {
    pub fn new(config: ReconConfig, units: Arc<UnitTerms>) -> Result<Self, ReconError> {
        config.validate()?;
        let policies = build_registry(&config, &units)?;
        let aliases = config.alias_index();
        Ok(Self {
            config,
            policies,
            aliases,
        })
    }

    /// Built once per process from the embedded field and unit tables.
    pub fn builtin() -> Result<&'static Reconciler, ReconError> {
        static BUILTIN: OnceLock<Reconciler> = OnceLock::new();
        if let Some(reconciler) = BUILTIN.get() {
            return Ok(reconciler);
        }
        let reconciler = Self::new(ReconConfig::builtin()?, UnitTerms::builtin()?)?;
        Ok(BUILTIN.get_or_init(|| reconciler))
    }

    /// Reconcile one label. The first policy error aborts the label.
    pub fn reconcile(
        &self,
        structured: &StructuredRecord,
        free_form: &FreeFormRecord,
        text: &str,
    ) -> Result<CanonicalRecord, ReconError> {
        let cleaned;
        let free_form = if self.config.clean_keys {
            cleaned = free_form.with_clean_keys();
            &cleaned
        } else {
            free_form
        };

        let mut record = CanonicalRecord::new();
        for policy in &self.policies {
            let partial = policy.reconcile(structured, free_form, text)?;
            debug_assert!(
                partial.keys().all(|k| policy.fields().contains(&k)),
                "policy wrote outside its fields: {:?}",
                partial.keys().collect::<Vec<_>>()
            );
            record.extend(partial);
        }
        Ok(record)
    }

    pub fn reconcile_label(&self, input: &LabelInput) -> LabelOutcome {
        let result = self.reconcile(&input.structured, &input.free_form, &input.text);
        match &result {
            Ok(record) => log::debug!("{}: {} field(s)", input.stem, record.len()),
            Err(e) => log::warn!("{}: {e}", input.stem),
        }
        LabelOutcome {
            stem: input.stem.clone(),
            result,
        }
    }

    /// Canonical fields in registry order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.config.fields.iter().map(|f| f.label.as_str())
    }

    pub fn aliases(&self) -> &AliasIndex {
        &self.aliases
    }

    pub fn fixable(&self) -> BTreeSet<String> {
        self.aliases.fixable()
    }

    pub fn config(&self) -> &ReconConfig {
        &self.config
    }

    pub fn policy_count(&self) -> usize {
        self.policies.len()
    }
}
