use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::alias::value_text;
use crate::darwin_core::{self, DYNAMIC_PROPERTIES};
use crate::error::{Origin, ReconError};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Output of the rule-based extractor for one label.
///
/// Keys are canonical field identifiers. A field's "explicitly labeled" flag
/// lives either at the top level or inside `dwc:dynamicProperties`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredRecord {
    fields: Map<String, Value>,
}

impl StructuredRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self, ReconError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(not_an_object(Origin::Structured, &other)),
        }
    }

    pub fn from_json_str(input: &str) -> Result<Self, ReconError> {
        let value = serde_json::from_str(input).map_err(|e| ReconError::InvalidRecord {
            origin: Origin::Structured,
            message: e.to_string(),
        })?;
        Self::from_value(value)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, label: &str) -> Option<&Value> {
        self.fields.get(label)
    }

    /// The field's value as canonical text; `None` when absent or blank.
    pub fn text(&self, label: &str) -> Option<String> {
        self.get(label).and_then(value_text)
    }

    /// True when the field has a value and its `flag_key` is set.
    pub fn is_labeled(&self, label: &str, flag_key: &str) -> bool {
        if self.text(label).is_none() {
            return false;
        }
        let nested = self
            .fields
            .get(DYNAMIC_PROPERTIES)
            .and_then(Value::as_object)
            .and_then(|props| props.get(flag_key));
        self.fields
            .get(flag_key)
            .or(nested)
            .is_some_and(is_truthy)
    }

    /// Count of values folded into the field with the join separator.
    pub fn cardinality(&self, label: &str) -> usize {
        self.text(label)
            .map_or(0, |text| darwin_core::field_len(&text))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Output of the language-model extractor for one label.
///
/// Keys are whatever the model produced; iteration follows the original key
/// order of the JSON document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FreeFormRecord {
    entries: Map<String, Value>,
}

impl FreeFormRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self, ReconError> {
        match value {
            Value::Object(entries) => Ok(Self { entries }),
            other => Err(not_an_object(Origin::FreeForm, &other)),
        }
    }

    pub fn from_json_str(input: &str) -> Result<Self, ReconError> {
        let value = serde_json::from_str(input).map_err(|e| ReconError::InvalidRecord {
            origin: Origin::FreeForm,
            message: e.to_string(),
        })?;
        Self::from_value(value)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy with every key passed through [`darwin_core::clean_key`].
    /// When two keys clean to the same term the first usable value wins;
    /// a blank or placeholder value never shadows a later one.
    pub fn with_clean_keys(&self) -> Self {
        let mut entries = Map::new();
        for (key, value) in &self.entries {
            let key = darwin_core::clean_key(key);
            match entries.get_mut(&key) {
                Some(kept) if value_text(kept).is_none() => *kept = value.clone(),
                Some(_) => {}
                None => {
                    entries.insert(key, value.clone());
                }
            }
        }
        Self { entries }
    }
}

fn not_an_object(origin: Origin, value: &Value) -> ReconError {
    let found = match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    ReconError::InvalidRecord {
        origin,
        message: format!("expected a JSON object, found {found}"),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("yes")
        }
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}

/// One label's three inputs, keyed by the shared file stem.
#[derive(Debug, Clone)]
pub struct LabelInput {
    pub stem: String,
    pub structured: StructuredRecord,
    pub free_form: FreeFormRecord,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Reconciled record for one label: canonical field → single string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CanonicalRecord(BTreeMap<String, String>);

impl CanonicalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Union another partial record into this one.
    pub fn extend(&mut self, other: CanonicalRecord) {
        self.0.extend(other.0);
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CanonicalRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Result of reconciling one label.
#[derive(Debug, Clone)]
pub struct LabelOutcome {
    pub stem: String,
    pub result: Result<CanonicalRecord, ReconError>,
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub total_labels: usize,
    pub reconciled: usize,
    pub failed: usize,
    /// Labels that reconciled to an empty record.
    pub empty: usize,
    /// How many reconciled records carry each canonical field.
    pub field_counts: BTreeMap<String, usize>,
    /// Failures by [`ReconError::kind`].
    pub error_counts: BTreeMap<String, usize>,
}
