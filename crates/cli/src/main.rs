// lrecon - batch reconciliation of specimen-label extractions
//
// stdout carries machine output only (--json); everything else goes to stderr.

mod audit;
mod exit_codes;
mod load;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use labelrecon::{ReconConfig, ReconError, Reconciler, UnitTerms};
use tracing_subscriber::EnvFilter;

use exit_codes::{recon_exit_code, EXIT_ERROR, EXIT_RECON_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "lrecon")]
#[command(about = "Reconcile rule-based and language-model label extractions into Darwin Core records")]
#[command(version)]
struct Cli {
    /// Verbose logging (-v debug, -vv trace); LRECON_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile every label present in both extraction directories
    #[command(after_help = "\
Examples:
  lrecon run --structured rules/ --free-form llm/ --output reconciled/
  lrecon run --structured rules/ --free-form llm/ --text ocr/ --output out/ --json
  lrecon run --structured rules/ --free-form llm/ --output out/ --config fields.toml --jobs 4")]
    Run {
        /// Directory of rule-extractor output, one <stem>.json per label
        #[arg(long)]
        structured: PathBuf,

        /// Directory of language-model output, one <stem>.json per label
        #[arg(long = "free-form")]
        free_form: PathBuf,

        /// Directory of raw label text, one <stem>.txt per label
        #[arg(long)]
        text: Option<PathBuf>,

        /// Directory for reconciled records (created if missing)
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// Field table to use instead of the built-in one
        #[arg(long)]
        config: Option<PathBuf>,

        /// Worker threads (default: one per core)
        #[arg(long, short = 'j')]
        jobs: Option<usize>,

        /// Print the batch report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Check a field table and list what it reconciles
    #[command(after_help = "\
Examples:
  lrecon validate
  lrecon validate fields.toml
  lrecon validate fields.toml --json")]
    Validate {
        /// Field table (default: built-in)
        config: Option<PathBuf>,

        /// Print fields, strategies and aliases as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Count malformed JSON and non-Darwin-Core keys in model output
    #[command(after_help = "\
Examples:
  lrecon audit --free-form llm/ --clean llm-cleaned/
  lrecon audit --free-form llm/ --clean llm-cleaned/ --json")]
    Audit {
        /// Directory of raw model output
        #[arg(long = "free-form")]
        free_form: PathBuf,

        /// Directory of hand-cleaned model output
        #[arg(long)]
        clean: PathBuf,

        /// Field table whose aliases count as fixable (default: built-in)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print per-label results and totals as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("LRECON_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    // fmt's init also routes `log` records from the engine through this subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            structured,
            free_form,
            text,
            output,
            config,
            jobs,
            json,
        } => recon::cmd_run(recon::RunArgs {
            structured,
            free_form,
            text,
            output,
            config,
            jobs,
            json,
        }),
        Commands::Validate { config, json } => recon::cmd_validate(config, json),
        Commands::Audit {
            free_form,
            clean,
            config,
            json,
        } => audit::cmd_audit(free_form, clean, config, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_RECON_IO, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Setup-time engine error (bad field table, unreadable file).
    pub fn recon(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
                Some("run `lrecon validate <config>` to check the field table".to_string())
            }
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Field table from `path`, or the built-in one.
pub fn load_config(path: Option<&PathBuf>) -> Result<ReconConfig, CliError> {
    let config = match path {
        Some(path) => ReconConfig::from_file(path),
        None => ReconConfig::builtin(),
    };
    config.map_err(CliError::recon)
}

pub fn build_reconciler(config: ReconConfig) -> Result<Reconciler, CliError> {
    let units = UnitTerms::builtin().map_err(CliError::recon)?;
    Reconciler::new(config, units).map_err(CliError::recon)
}
