//! `lrecon audit`: key audit of model output against its cleaned copy.

use std::path::PathBuf;

use labelrecon::audit::{audit_label, summarize, AuditSummary, LabelAudit};
use serde::Serialize;

use crate::exit_codes::EXIT_AUDIT_INVALID_JSON;
use crate::load::json_stems;
use crate::{build_reconciler, load_config, CliError};

#[derive(Serialize)]
struct AuditReport<'a> {
    summary: &'a AuditSummary,
    labels: &'a [LabelAudit],
}

pub fn cmd_audit(
    free_form: PathBuf,
    clean: PathBuf,
    config: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    let fixable = build_reconciler(load_config(config.as_ref())?)?.fixable();
    let raw_files = json_stems(&free_form)?;
    let clean_files = json_stems(&clean)?;

    let mut audits = Vec::with_capacity(raw_files.len());
    for (stem, raw_path) in &raw_files {
        let raw = std::fs::read_to_string(raw_path)
            .map_err(|e| CliError::io(format!("cannot read {}: {e}", raw_path.display())))?;
        let cleaned = match clean_files.get(stem) {
            Some(path) => Some(
                std::fs::read_to_string(path)
                    .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?,
            ),
            None => None,
        };

        let audit = audit_label(stem, &raw, cleaned.as_deref(), &fixable).map_err(|e| {
            CliError::new(EXIT_AUDIT_INVALID_JSON, e.to_string())
                .with_hint("cleaned files must hold a single JSON object")
        })?;
        if !audit.bad_terms.is_empty() {
            log::debug!("{stem}: bad terms {:?}", audit.bad_terms);
        }
        audits.push(audit);
    }

    let summary = summarize(&audits);
    if json {
        let report = AuditReport {
            summary: &summary,
            labels: &audits,
        };
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{out}");
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(s: &AuditSummary) {
    eprintln!("{:<40}{:>6}", "total labels", s.total_labels);
    eprintln!("{:<40}{:>6}", "missing cleaned files", s.missing_files);
    eprintln!("{:<40}{:>6}", "files with bad JSON", s.bad_json_files);
    eprintln!("{:<40}{:>6}", "labels with bad terms", s.labels_with_bad_terms);
    eprintln!(
        "{:<40}{:>6}",
        "labels with bad JSON and bad terms", s.labels_with_bad_json_and_bad_terms
    );
    eprintln!("{:<40}{:>6}", "labels with fixed terms", s.labels_with_fixed_terms);
    eprintln!("{:<40}{:>6}", "terms", s.terms);
    eprintln!("{:<40}{:>6}", "bad terms", s.bad_terms);
    eprintln!("{:<40}{:>6}", "fixed terms", s.fixed_terms);
}
