use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::alias::{AliasIndex, AliasSet};
use crate::darwin_core;
use crate::error::ReconError;
use crate::units::Bound;

const BUILTIN_FIELDS: &str = include_str!("../data/fields.toml");

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// The field table: one entry per canonical field, in registry order.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    /// Normalize free-form keys before any policy sees them.
    #[serde(default = "default_clean_keys")]
    pub clean_keys: bool,
    #[serde(rename = "field", default)]
    pub fields: Vec<FieldConfig>,
}

fn default_clean_keys() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    /// Namespaced canonical identifier, e.g. `dwc:recordNumber`.
    pub label: String,
    /// Other spellings extractors use. Entries may hold several
    /// whitespace-separated names.
    #[serde(default)]
    pub synonyms: Vec<String>,
    pub strategy: Strategy,
    /// Key substring tried when no alias matches.
    #[serde(default)]
    pub wildcard: Option<String>,
    /// Name of the "explicitly labeled" flag; defaults to `<localName>IsLabeled`.
    #[serde(default)]
    pub labeled_key: Option<String>,
    /// Free-form keys whose value confirms the structured value.
    #[serde(default)]
    pub confirm_with: Vec<String>,
    #[serde(default)]
    pub bound: Option<Bound>,
}

impl FieldConfig {
    pub fn aliases(&self) -> AliasSet {
        AliasSet::new(&self.label, &self.synonyms)
    }

    pub fn labeled_key(&self) -> String {
        match &self.labeled_key {
            Some(key) => key.clone(),
            None => format!("{}IsLabeled", darwin_core::local_name(&self.label)),
        }
    }

    /// Alias set built from `confirm_with`, if any.
    pub fn confirm_aliases(&self) -> Option<AliasSet> {
        let (first, rest) = self.confirm_with.split_first()?;
        Some(AliasSet::new(first, rest))
    }
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    FreeForm,
    FreeFormThenStructured,
    StructuredFirst,
    LabeledIdentifier,
    Agreement,
    Meters,
    RecordedBy,
    IdentifiedBy,
    RecordNumber,
    EventDate,
    VerbatimEventDate,
}

/// Strategies that only work as a group owned by one policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bundle {
    Collector,
    Date,
}

impl Bundle {
    pub fn members(&self) -> &'static [Strategy] {
        match self {
            Self::Collector => &[
                Strategy::RecordedBy,
                Strategy::IdentifiedBy,
                Strategy::RecordNumber,
            ],
            Self::Date => &[Strategy::EventDate, Strategy::VerbatimEventDate],
        }
    }
}

impl std::fmt::Display for Bundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Collector => write!(f, "collector"),
            Self::Date => write!(f, "date"),
        }
    }
}

impl Strategy {
    pub fn bundle(&self) -> Option<Bundle> {
        match self {
            Self::RecordedBy | Self::IdentifiedBy | Self::RecordNumber => Some(Bundle::Collector),
            Self::EventDate | Self::VerbatimEventDate => Some(Bundle::Date),
            _ => None,
        }
    }

    fn takes_wildcard(&self) -> bool {
        matches!(
            self,
            Self::FreeForm | Self::FreeFormThenStructured | Self::StructuredFirst
        )
    }

    fn takes_labeled(&self) -> bool {
        matches!(self, Self::LabeledIdentifier | Self::RecordNumber)
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Self::FreeForm => "free_form",
            Self::FreeFormThenStructured => "free_form_then_structured",
            Self::StructuredFirst => "structured_first",
            Self::LabeledIdentifier => "labeled_identifier",
            Self::Agreement => "agreement",
            Self::Meters => "meters",
            Self::RecordedBy => "recorded_by",
            Self::IdentifiedBy => "identified_by",
            Self::RecordNumber => "record_number",
            Self::EventDate => "event_date",
            Self::VerbatimEventDate => "verbatim_event_date",
        };
        write!(f, "{tag}")
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    /// The embedded field table.
    pub fn builtin() -> Result<Self, ReconError> {
        Self::from_toml(BUILTIN_FIELDS)
    }

    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ReconError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| ReconError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml(&input)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.fields.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one [[field]] is required".into(),
            ));
        }

        // Labels: namespaced, single word, unique ignoring case
        let mut labels: HashMap<String, &str> = HashMap::new();
        for field in &self.fields {
            let label = field.label.trim();
            let namespaced = label
                .split_once(':')
                .is_some_and(|(ns, local)| !ns.is_empty() && !local.is_empty());
            if !namespaced || label.contains(char::is_whitespace) || label != field.label {
                return Err(ReconError::ConfigValidation(format!(
                    "field '{}': label must be a namespaced term like 'dwc:country'",
                    field.label
                )));
            }
            if let Some(prev) = labels.insert(label.to_lowercase(), label) {
                return Err(ReconError::ConfigValidation(format!(
                    "field '{label}': duplicates field '{prev}'"
                )));
            }
        }

        for field in &self.fields {
            self.validate_field(field, &labels)?;
        }

        self.validate_bundles()
    }

    fn validate_field(
        &self,
        field: &FieldConfig,
        labels: &HashMap<String, &str>,
    ) -> Result<(), ReconError> {
        let label = &field.label;
        let own = label.to_lowercase();

        for word in field.synonyms.iter().flat_map(|s| s.split_whitespace()) {
            let folded = word.to_lowercase();
            if folded != own {
                if let Some(other) = labels.get(&folded) {
                    return Err(ReconError::ConfigValidation(format!(
                        "field '{label}': synonym '{word}' is the label of field '{other}'"
                    )));
                }
            }
        }

        if let Some(pattern) = &field.wildcard {
            if !field.strategy.takes_wildcard() {
                return Err(option_not_allowed(field, "wildcard"));
            }
            if pattern.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "field '{label}': wildcard pattern is empty"
                )));
            }
        }

        if !field.strategy.takes_labeled() {
            if field.labeled_key.is_some() {
                return Err(option_not_allowed(field, "labeled_key"));
            }
            if !field.confirm_with.is_empty() {
                return Err(option_not_allowed(field, "confirm_with"));
            }
        }

        if field.bound.is_some() && field.strategy != Strategy::Meters {
            return Err(option_not_allowed(field, "bound"));
        }

        Ok(())
    }

    /// Each bundle is either absent or present with every member exactly once.
    fn validate_bundles(&self) -> Result<(), ReconError> {
        for bundle in [Bundle::Collector, Bundle::Date] {
            let members = bundle.members();
            let mut present = 0;
            for strategy in members {
                let owners: Vec<&str> = self
                    .fields
                    .iter()
                    .filter(|f| f.strategy == *strategy)
                    .map(|f| f.label.as_str())
                    .collect();
                if owners.len() > 1 {
                    return Err(ReconError::ConfigValidation(format!(
                        "strategy '{strategy}' is used by more than one field: {}",
                        owners.join(", ")
                    )));
                }
                present += owners.len();
            }
            if present != 0 && present != members.len() {
                let missing: Vec<String> = members
                    .iter()
                    .filter(|s| self.field_with(**s).is_none())
                    .map(ToString::to_string)
                    .collect();
                return Err(ReconError::ConfigValidation(format!(
                    "{bundle} bundle is incomplete: missing {}",
                    missing.join(", ")
                )));
            }
        }
        Ok(())
    }

    pub fn field(&self, label: &str) -> Option<&FieldConfig> {
        self.fields.iter().find(|f| f.label == label)
    }

    /// First field using `strategy`.
    pub fn field_with(&self, strategy: Strategy) -> Option<&FieldConfig> {
        self.fields.iter().find(|f| f.strategy == strategy)
    }

    pub fn alias_index(&self) -> AliasIndex {
        AliasIndex::new(self.fields.iter().map(FieldConfig::aliases).collect())
    }
}

fn option_not_allowed(field: &FieldConfig, option: &str) -> ReconError {
    ReconError::ConfigValidation(format!(
        "field '{}': '{option}' does not apply to strategy '{}'",
        field.label, field.strategy
    ))
}

/// Keys a policy silently repairs: every alias minus the canonical labels.
pub fn fixable_aliases(config: &ReconConfig) -> BTreeSet<String> {
    config.alias_index().fixable()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
