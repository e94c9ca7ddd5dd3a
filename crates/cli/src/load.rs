//! Directory loading: label stems, pairing, and per-label input files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use labelrecon::{FreeFormRecord, LabelInput, ReconError, StructuredRecord};

use crate::CliError;

/// `<stem>.json` files in `dir`, by stem.
pub fn json_stems(dir: &Path) -> Result<BTreeMap<String, PathBuf>, CliError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| CliError::io(format!("cannot read directory {}: {e}", dir.display())))?;

    let mut stems = BTreeMap::new();
    for entry in entries {
        let path = entry
            .map_err(|e| CliError::io(format!("cannot read directory {}: {e}", dir.display())))?
            .path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            stems.insert(stem.to_string(), path.clone());
        }
    }
    Ok(stems)
}

/// Labels with both extractions, plus the stems missing a partner.
#[derive(Debug, Default)]
pub struct Pairing {
    pub labels: Vec<(String, PathBuf, PathBuf)>,
    pub structured_only: Vec<String>,
    pub free_form_only: Vec<String>,
}

impl Pairing {
    pub fn missing_partner(&self) -> usize {
        self.structured_only.len() + self.free_form_only.len()
    }
}

pub fn pair(
    structured: &BTreeMap<String, PathBuf>,
    free_form: &BTreeMap<String, PathBuf>,
) -> Pairing {
    let mut pairing = Pairing::default();
    for (stem, s_path) in structured {
        match free_form.get(stem) {
            Some(f_path) => pairing
                .labels
                .push((stem.clone(), s_path.clone(), f_path.clone())),
            None => pairing.structured_only.push(stem.clone()),
        }
    }
    pairing.free_form_only = free_form
        .keys()
        .filter(|stem| !structured.contains_key(*stem))
        .cloned()
        .collect();
    pairing
}

fn read(path: &Path) -> Result<String, ReconError> {
    std::fs::read_to_string(path).map_err(|e| ReconError::Io(format!("{}: {e}", path.display())))
}

/// Read and parse one label's inputs. Missing text is empty text.
pub fn load_label(
    stem: &str,
    structured: &Path,
    free_form: &Path,
    text_dir: Option<&Path>,
) -> Result<LabelInput, ReconError> {
    let structured = StructuredRecord::from_json_str(&read(structured)?)?;
    let free_form = FreeFormRecord::from_json_str(&read(free_form)?)?;

    let text = match text_dir.map(|dir| dir.join(format!("{stem}.txt"))) {
        Some(path) if path.exists() => read(&path)?,
        _ => String::new(),
    };

    Ok(LabelInput {
        stem: stem.to_string(),
        structured,
        free_form,
        text,
    })
}
