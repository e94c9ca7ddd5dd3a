//! `lrecon run` and `lrecon validate`.

use std::path::{Path, PathBuf};

use labelrecon::{compute_summary, BatchSummary, LabelOutcome, Reconciler};
use rayon::prelude::*;
use serde::Serialize;

use crate::exit_codes::EXIT_RECON_LABEL_FAILURES;
use crate::load::{json_stems, load_label, pair};
use crate::{build_reconciler, load_config, CliError};

pub struct RunArgs {
    pub structured: PathBuf,
    pub free_form: PathBuf,
    pub text: Option<PathBuf>,
    pub output: PathBuf,
    pub config: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub json: bool,
}

#[derive(Serialize)]
struct RunReport {
    #[serde(flatten)]
    summary: BatchSummary,
    missing_partner: usize,
    output_dir: String,
    failures: Vec<FailureReport>,
}

#[derive(Serialize)]
struct FailureReport {
    stem: String,
    kind: &'static str,
    message: String,
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    if args.jobs == Some(0) {
        return Err(CliError::usage("--jobs must be at least 1"));
    }

    let reconciler = build_reconciler(load_config(args.config.as_ref())?)?;

    let pairing = pair(&json_stems(&args.structured)?, &json_stems(&args.free_form)?);
    for stem in &pairing.structured_only {
        log::warn!("{stem}: no free-form extraction, skipped");
    }
    for stem in &pairing.free_form_only {
        log::warn!("{stem}: no structured extraction, skipped");
    }
    log::info!("reconciling {} label(s)", pairing.labels.len());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs.unwrap_or(0))
        .build()
        .map_err(|e| CliError::general(format!("cannot start worker pool: {e}")))?;

    let text_dir = args.text.as_deref();
    let mut outcomes: Vec<LabelOutcome> = pool.install(|| {
        pairing
            .labels
            .par_iter()
            .map(|(stem, s_path, f_path)| reconcile_one(&reconciler, stem, s_path, f_path, text_dir))
            .collect()
    });
    outcomes.sort_by(|a, b| a.stem.cmp(&b.stem));

    write_records(&args.output, &outcomes)?;

    let summary = compute_summary(&outcomes);
    let failures: Vec<FailureReport> = outcomes
        .iter()
        .filter_map(|o| {
            let err = o.result.as_ref().err()?;
            Some(FailureReport {
                stem: o.stem.clone(),
                kind: err.kind(),
                message: err.to_string(),
            })
        })
        .collect();

    if args.json {
        let report = RunReport {
            summary: summary.clone(),
            missing_partner: pairing.missing_partner(),
            output_dir: args.output.display().to_string(),
            failures,
        };
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json}");
    } else {
        print_summary(&summary, pairing.missing_partner(), &args.output);
    }

    if summary.failed > 0 {
        return Err(CliError::new(
            EXIT_RECON_LABEL_FAILURES,
            format!("{} of {} label(s) failed", summary.failed, summary.total_labels),
        )
        .with_hint("failed labels are logged above; successful labels were written"));
    }
    Ok(())
}

fn reconcile_one(
    reconciler: &Reconciler,
    stem: &str,
    structured: &Path,
    free_form: &Path,
    text_dir: Option<&Path>,
) -> LabelOutcome {
    match load_label(stem, structured, free_form, text_dir) {
        Ok(input) => reconciler.reconcile_label(&input),
        Err(e) => {
            log::warn!("{stem}: {e}");
            LabelOutcome {
                stem: stem.to_string(),
                result: Err(e),
            }
        }
    }
}

fn write_records(dir: &Path, outcomes: &[LabelOutcome]) -> Result<(), CliError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| CliError::io(format!("cannot create {}: {e}", dir.display())))?;

    for outcome in outcomes {
        let Ok(record) = &outcome.result else {
            continue;
        };
        let path = dir.join(format!("{}.json", outcome.stem));
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        std::fs::write(&path, json)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
    }
    Ok(())
}

fn print_summary(summary: &BatchSummary, missing_partner: usize, output: &Path) {
    eprintln!(
        "{} label(s): {} reconciled, {} failed, {} empty, {} missing a partner",
        summary.total_labels, summary.reconciled, summary.failed, summary.empty, missing_partner,
    );
    if summary.reconciled > 0 {
        eprintln!("wrote {} record(s) to {}", summary.reconciled, output.display());
    }
    if !summary.field_counts.is_empty() {
        eprintln!("fields:");
        for (field, count) in &summary.field_counts {
            eprintln!("  {field:<36}{count:>6}");
        }
    }
    if !summary.error_counts.is_empty() {
        eprintln!("errors:");
        for (kind, count) in &summary.error_counts {
            eprintln!("  {kind:<36}{count:>6}");
        }
    }
}

// ============================================================================
// validate
// ============================================================================

#[derive(Serialize)]
struct FieldReport<'a> {
    label: &'a str,
    strategy: String,
    aliases: Vec<&'a str>,
}

#[derive(Serialize)]
struct ValidateReport<'a> {
    valid: bool,
    clean_keys: bool,
    policies: usize,
    fields: Vec<FieldReport<'a>>,
    fixable: Vec<String>,
}

pub fn cmd_validate(config: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let source = config
        .as_ref()
        .map_or_else(|| "built-in field table".to_string(), |p| p.display().to_string());
    let reconciler = build_reconciler(load_config(config.as_ref())?)?;
    let fixable = reconciler.fixable();

    if json {
        let fields = reconciler
            .config()
            .fields
            .iter()
            .map(|field| FieldReport {
                label: &field.label,
                strategy: field.strategy.to_string(),
                aliases: reconciler
                    .aliases()
                    .get(&field.label)
                    .map(|set| set.synonyms().collect())
                    .unwrap_or_default(),
            })
            .collect();
        let report = ValidateReport {
            valid: true,
            clean_keys: reconciler.config().clean_keys,
            policies: reconciler.policy_count(),
            fields,
            fixable: fixable.into_iter().collect(),
        };
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{out}");
    } else {
        eprintln!(
            "{source}: ok ({} fields, {} policies, {} fixable aliases)",
            reconciler.fields().count(),
            reconciler.policy_count(),
            fixable.len(),
        );
    }
    Ok(())
}
