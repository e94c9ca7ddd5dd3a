//! Event-date reconciliation.
//!
//! Both extractors report dates, in different shapes. The rule extractor
//! gives parallel lists of normalized dates and the verbatim phrases they
//! came from; the model gives a string, a list, or a `{year, month, day}`
//! mapping. Entries are aligned by calendar date. A rule date read from a
//! Roman-numeral phrase is trusted over the model (models routinely misread
//! "3 III 1998"); otherwise the model's date wins and the rule extractor only
//! contributes its verbatim phrase.

mod parse;
mod roman;

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;

use crate::alias::{is_placeholder, search, AliasSet};
use crate::darwin_core::SEP;
use crate::error::{Origin, ReconError};
use crate::model::{CanonicalRecord, FreeFormRecord, StructuredRecord};
use crate::policy::FieldPolicy;

pub use parse::parse_date;
pub use roman::{has_roman, replace_roman};

/// A date reported by the language model.
#[derive(Debug, Clone, PartialEq)]
struct FreeFormDate {
    key: NaiveDate,
    raw_date: String,
}

/// A date reported by the rule extractor.
#[derive(Debug, Clone, PartialEq)]
struct StructuredDate {
    key: NaiveDate,
    raw_date: String,
    raw_verbatim: String,
    has_roman: bool,
}

#[derive(Debug, Default)]
struct Aligned {
    free_form: Option<FreeFormDate>,
    structured: Option<StructuredDate>,
}

/// Owns `dwc:eventDate` and `dwc:verbatimEventDate`.
#[derive(Debug, Clone)]
pub struct DateReconciler {
    aliases: AliasSet,
    verbatim_label: String,
}

impl DateReconciler {
    pub fn new(aliases: AliasSet, verbatim_label: &str) -> Self {
        Self {
            aliases,
            verbatim_label: verbatim_label.to_string(),
        }
    }

    fn label(&self) -> &str {
        self.aliases.label()
    }

    fn free_form_dates(&self, value: &Value) -> Result<Vec<FreeFormDate>, ReconError> {
        let shape_error = || ReconError::UnrecognizedPayloadShape {
            field: self.label().to_string(),
            origin: Origin::FreeForm,
            value: value.to_string(),
        };

        let raw_dates: Vec<String> = match value {
            Value::String(s) => vec![s.trim().to_string()],
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty() && !is_placeholder(s))
                .map(str::to_string)
                .collect(),
            Value::Object(parts) => {
                let part = |name: &str| match parts.get(name) {
                    Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    Some(Value::Number(n)) => Some(n.to_string()),
                    _ => None,
                };
                match (part("year"), part("month"), part("day")) {
                    (Some(y), Some(m), Some(d)) => vec![format!("{y}-{m}-{d}")],
                    _ => return Err(shape_error()),
                }
            }
            _ => return Err(shape_error()),
        };

        raw_dates
            .into_iter()
            .map(|raw_date| {
                let key = parse_date(&replace_roman(&raw_date)).ok_or_else(|| {
                    ReconError::DateParse {
                        field: self.label().to_string(),
                        origin: Origin::FreeForm,
                        value: raw_date.clone(),
                    }
                })?;
                Ok(FreeFormDate { key, raw_date })
            })
            .collect()
    }

    fn structured_dates(&self, structured: &StructuredRecord) -> Result<Vec<StructuredDate>, ReconError> {
        static CLEAN: OnceLock<Regex> = OnceLock::new();
        let clean = CLEAN.get_or_init(|| Regex::new(r"(?i)date").expect("valid regex"));

        let Some(dates) = structured.text(self.label()) else {
            return Ok(Vec::new());
        };
        let raw_dates: Vec<&str> = dates.split(SEP).map(str::trim).collect();

        let verbatims = structured.text(&self.verbatim_label);
        let phrases: Vec<&str> = match &verbatims {
            Some(text) => text.split(SEP).map(str::trim).collect(),
            None => vec![""; raw_dates.len()],
        };
        if phrases.len() != raw_dates.len() {
            return Err(ReconError::MisalignedLists {
                field: self.label().to_string(),
                dates: raw_dates.len(),
                verbatims: phrases.len(),
            });
        }

        let parse_error = |field: &str, value: &str| ReconError::DateParse {
            field: field.to_string(),
            origin: Origin::Structured,
            value: value.to_string(),
        };

        raw_dates
            .into_iter()
            .zip(phrases)
            .map(|(raw_date, phrase)| {
                let key = parse_date(&replace_roman(raw_date))
                    .ok_or_else(|| parse_error(self.label(), raw_date))?;

                let cleaned = clean.replace_all(phrase, "");
                if !cleaned.trim().is_empty() && parse_date(&replace_roman(&cleaned)).is_none() {
                    return Err(parse_error(&self.verbatim_label, phrase));
                }

                Ok(StructuredDate {
                    key,
                    raw_date: raw_date.to_string(),
                    raw_verbatim: phrase.to_string(),
                    has_roman: has_roman(&cleaned),
                })
            })
            .collect()
    }
}

/// Group entries by calendar date in first-seen order. A later entry from
/// the same source for the same date replaces the earlier one.
fn align(free_form: Vec<FreeFormDate>, structured: Vec<StructuredDate>) -> Vec<Aligned> {
    let mut slots: Vec<(NaiveDate, Aligned)> = Vec::new();

    fn slot(slots: &mut Vec<(NaiveDate, Aligned)>, key: NaiveDate) -> &mut Aligned {
        let idx = match slots.iter().position(|(k, _)| *k == key) {
            Some(idx) => idx,
            None => {
                slots.push((key, Aligned::default()));
                slots.len() - 1
            }
        };
        &mut slots[idx].1
    }

    for date in free_form {
        let key = date.key;
        slot(&mut slots, key).free_form = Some(date);
    }
    for date in structured {
        let key = date.key;
        slot(&mut slots, key).structured = Some(date);
    }

    slots.into_iter().map(|(_, aligned)| aligned).collect()
}

impl FieldPolicy for DateReconciler {
    fn fields(&self) -> Vec<&str> {
        vec![self.label(), self.verbatim_label.as_str()]
    }

    fn reconcile(
        &self,
        structured: &StructuredRecord,
        free_form: &FreeFormRecord,
        _text: &str,
    ) -> Result<CanonicalRecord, ReconError> {
        let free_form_dates = match search(free_form, &self.aliases) {
            Some(value) => self.free_form_dates(value)?,
            None => Vec::new(),
        };
        let structured_dates = self.structured_dates(structured)?;

        let mut dates: Vec<String> = Vec::new();
        let mut verbatims: Vec<String> = Vec::new();

        for aligned in align(free_form_dates, structured_dates) {
            match (aligned.free_form, aligned.structured) {
                (_, Some(rule)) if rule.has_roman => {
                    dates.push(rule.raw_date);
                    verbatims.push(rule.raw_verbatim);
                }
                (Some(model), rule) => {
                    dates.push(model.raw_date);
                    if let Some(rule) = rule.filter(|r| !r.raw_verbatim.is_empty()) {
                        verbatims.push(rule.raw_verbatim);
                    }
                }
                (None, _) => {}
            }
        }

        let mut out = CanonicalRecord::new();
        if !dates.is_empty() {
            out.insert(self.label(), dates.join(SEP));
        }
        if !verbatims.is_empty() {
            out.insert(self.verbatim_label.as_str(), verbatims.join(SEP));
        }
        Ok(out)
    }
}
