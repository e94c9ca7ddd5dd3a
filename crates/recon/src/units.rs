//! Unit term table: unit tokens → length conversion factors.
//!
//! Loaded once from the embedded CSV term files and shared read-only by every
//! measurement policy.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Deserialize;

use crate::error::ReconError;

const LENGTH_TERMS: &str = include_str!("../data/unit_length_terms.csv");
const TIC_TERMS: &str = include_str!("../data/unit_tic_terms.csv");

/// Which end of a numeric range a measurement field keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    Min,
    Max,
}

#[derive(Debug, Clone, Default)]
pub struct UnitTerms {
    factors_cm: HashMap<String, f64>,
    factors_m: HashMap<String, f64>,
}

impl UnitTerms {
    /// Parse term CSVs with `pattern` and `factor_cm` columns.
    /// Rows without a factor are not units and are skipped.
    pub fn from_csv(sources: &[&str]) -> Result<Self, ReconError> {
        let mut factors_cm = HashMap::new();

        for source in sources {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(true)
                .from_reader(source.as_bytes());

            let headers = reader
                .headers()
                .map_err(|e| ReconError::UnitTable(e.to_string()))?
                .clone();
            let idx = |name: &str| -> Result<usize, ReconError> {
                headers
                    .iter()
                    .position(|h| h == name)
                    .ok_or_else(|| ReconError::UnitTable(format!("missing column '{name}'")))
            };
            let pattern_idx = idx("pattern")?;
            let factor_idx = idx("factor_cm")?;

            for record in reader.records() {
                let record = record.map_err(|e| ReconError::UnitTable(e.to_string()))?;
                let pattern = record.get(pattern_idx).unwrap_or("").trim();
                let factor = record.get(factor_idx).unwrap_or("").trim();
                if pattern.is_empty() || factor.is_empty() {
                    continue;
                }
                let factor: f64 = factor.parse().map_err(|_| {
                    ReconError::UnitTable(format!("pattern '{pattern}': bad factor '{factor}'"))
                })?;
                factors_cm.insert(pattern.to_lowercase(), factor);
            }
        }

        let factors_m = factors_cm
            .iter()
            .map(|(k, v)| (k.clone(), v / 100.0))
            .collect();

        Ok(Self {
            factors_cm,
            factors_m,
        })
    }

    /// The embedded length and tic tables, parsed once per process.
    pub fn builtin() -> Result<Arc<UnitTerms>, ReconError> {
        static BUILTIN: OnceLock<Arc<UnitTerms>> = OnceLock::new();
        if let Some(terms) = BUILTIN.get() {
            return Ok(Arc::clone(terms));
        }
        let terms = Arc::new(Self::from_csv(&[LENGTH_TERMS, TIC_TERMS])?);
        Ok(Arc::clone(BUILTIN.get_or_init(|| terms)))
    }

    pub fn factor_cm(&self, unit: &str) -> Option<f64> {
        lookup(&self.factors_cm, unit)
    }

    pub fn factor_m(&self, unit: &str) -> Option<f64> {
        lookup(&self.factors_m, unit)
    }

    pub fn len(&self) -> usize {
        self.factors_cm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors_cm.is_empty()
    }

    /// Convert a measurement phrase such as `"1,200-1,500 ft"` to meters.
    ///
    /// The first recognized unit token applies; without one the value is
    /// taken to be in meters already. `None` when the text has no number.
    pub fn to_meters(&self, text: &str, bound: Option<Bound>) -> Option<String> {
        static NUMBER: OnceLock<Regex> = OnceLock::new();
        static UNIT: OnceLock<Regex> = OnceLock::new();
        let number = NUMBER.get_or_init(|| {
            Regex::new(r"\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?").expect("valid regex")
        });
        let unit = UNIT.get_or_init(|| Regex::new(r#"[^\W\d_]+\.?|['"′″]"#).expect("valid regex"));

        let numbers: Vec<f64> = number
            .find_iter(text)
            .filter_map(|m| m.as_str().replace(',', "").parse().ok())
            .collect();
        let value = match bound {
            Some(Bound::Max) => numbers.last(),
            _ => numbers.first(),
        }?;

        let factor = unit
            .find_iter(text)
            .find_map(|m| self.factor_m(m.as_str()))
            .unwrap_or(1.0);

        Some(format_meters(value * factor))
    }
}

fn lookup(table: &HashMap<String, f64>, unit: &str) -> Option<f64> {
    let unit = unit.trim().to_lowercase();
    table
        .get(&unit)
        .or_else(|| table.get(unit.trim_end_matches('.')))
        .copied()
}

/// At most two decimals, no trailing zeros.
fn format_meters(value: f64) -> String {
    let text = format!("{value:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
