//! Alias sets and the lookup primitives every field policy shares.
//!
//! A field is known by its canonical label plus any number of synonyms that
//! extractors tend to produce instead. Lookups are case-insensitive and walk
//! the aliases in declaration order, so earlier synonyms win ties.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::darwin_core::{local_name, SEP};
use crate::model::FreeFormRecord;

/// Free-form values that mean "no information".
pub const PLACEHOLDERS: &[&str] = &["null", "none", "not provided", "not specified"];

pub fn is_placeholder(text: &str) -> bool {
    let folded = text.trim().to_lowercase();
    PLACEHOLDERS.contains(&folded.as_str())
}

fn is_placeholder_value(value: &Value) -> bool {
    value.as_str().is_some_and(is_placeholder)
}

/// Null, blank strings and empty containers carry nothing.
fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Render an extractor value as canonical text.
///
/// Lists keep only their string elements and are joined with [`SEP`];
/// placeholders and blanks count as missing.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty() && !is_placeholder(s)).then(|| s.to_string())
        }
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty() && !is_placeholder(s))
                .collect();
            (!parts.is_empty()).then(|| parts.join(SEP))
        }
        Value::Object(map) if map.is_empty() => None,
        Value::Object(_) => Some(value.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Alias sets
// ---------------------------------------------------------------------------

/// Every spelling that denotes one canonical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasSet {
    label: String,
    names: Vec<String>,
}

impl AliasSet {
    /// Canonical label first, then each synonym; every entry contributes its
    /// own spelling and its lower-cased form. Duplicates keep their first slot.
    pub fn new<S: AsRef<str>>(label: &str, synonyms: &[S]) -> Self {
        let words = std::iter::once(label)
            .chain(synonyms.iter().map(AsRef::as_ref))
            .flat_map(str::split_whitespace);

        let mut names: Vec<String> = Vec::new();
        for word in words {
            for name in [word.to_string(), word.to_lowercase()] {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        Self {
            label: label.to_string(),
            names,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// All spellings in priority order, canonical label included.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Spellings other than the canonical label itself.
    pub fn synonyms(&self) -> impl Iterator<Item = &str> {
        self.names
            .iter()
            .map(String::as_str)
            .filter(move |name| *name != self.label)
    }

    /// Does this external key mean this field?
    pub fn matches(&self, key: &str) -> bool {
        let folded = key.trim().to_lowercase();
        self.names.iter().any(|name| name.to_lowercase() == folded)
    }
}

/// Alias sets for every field in the registry, in registry order.
#[derive(Debug, Clone, Default)]
pub struct AliasIndex {
    sets: Vec<AliasSet>,
}

impl AliasIndex {
    pub fn new(sets: Vec<AliasSet>) -> Self {
        Self { sets }
    }

    pub fn get(&self, label: &str) -> Option<&AliasSet> {
        self.sets.iter().find(|set| set.label == label)
    }

    /// Canonical label an external key stands for, if any.
    pub fn resolve(&self, key: &str) -> Option<&str> {
        self.sets
            .iter()
            .find(|set| set.matches(key))
            .map(AliasSet::label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AliasSet> {
        self.sets.iter()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Every known alias minus the canonical labels: keys a policy will
    /// silently repair when an extractor uses them.
    pub fn fixable(&self) -> BTreeSet<String> {
        let mut fix: BTreeSet<String> = self
            .sets
            .iter()
            .flat_map(|set| set.names.iter().cloned())
            .collect();
        for set in &self.sets {
            fix.remove(&set.label);
        }
        fix
    }
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// First value stored under any alias of the field that is neither absent nor
/// a placeholder. Aliases are tried in order; for one alias, record keys are
/// tried in record order.
pub fn search<'a>(record: &'a FreeFormRecord, aliases: &AliasSet) -> Option<&'a Value> {
    for name in aliases.names() {
        let folded = name.to_lowercase();
        let hit = record.iter().find_map(|(key, value)| {
            let usable = key.trim().to_lowercase() == folded
                && !is_absent(value)
                && !is_placeholder_value(value);
            usable.then_some(value)
        });
        if hit.is_some() {
            return hit;
        }
    }
    None
}

/// Value of the first key containing `pattern` (case-insensitive).
///
/// Iteration stops at the first placeholder entry, whether the placeholder is
/// the key or the value, and yields nothing.
pub fn wildcard<'a>(record: &'a FreeFormRecord, pattern: &str) -> Option<&'a Value> {
    let pattern = pattern.to_lowercase();
    for (key, value) in record.iter() {
        if is_placeholder(key) || is_placeholder(local_name(key)) || is_placeholder_value(value) {
            return None;
        }
        if key.to_lowercase().contains(&pattern) && !is_absent(value) {
            return Some(value);
        }
    }
    None
}

/// [`search`] rendered through [`value_text`].
pub fn search_text(record: &FreeFormRecord, aliases: &AliasSet) -> Option<String> {
    search(record, aliases).and_then(value_text)
}
