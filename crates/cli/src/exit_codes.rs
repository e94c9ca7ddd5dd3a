//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `lrecon` exit codes.
//! Exit codes are part of the shell contract: batch scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                              |
//! |---------|-----------|------------------------------------------|
//! | 0       | Universal | Success                                  |
//! | 1       | Universal | General error (unspecified)              |
//! | 2       | Universal | CLI usage error (bad args)               |
//! | 3-9     | run       | Reconciliation batch codes               |
//! | 10-19   | audit     | Key audit codes                          |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use labelrecon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Run (3-9)
// =============================================================================

/// At least one label failed to reconcile. Successful labels were still written.
pub const EXIT_RECON_LABEL_FAILURES: u8 = 3;

/// Field table could not be parsed or failed validation.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 4;

/// Input directory unreadable or output not writable.
pub const EXIT_RECON_IO: u8 = 5;

/// Embedded unit term table failed to load.
pub const EXIT_RECON_UNIT_TABLE: u8 = 6;

// =============================================================================
// Audit (10-19)
// =============================================================================

/// A cleaned model output is not a JSON object.
pub const EXIT_AUDIT_INVALID_JSON: u8 = 10;

/// Map a setup-time engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_RECON_INVALID_CONFIG,
        ReconError::UnitTable(_) => EXIT_RECON_UNIT_TABLE,
        ReconError::Io(_) => EXIT_RECON_IO,
        _ => EXIT_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_map_to_invalid_config() {
        assert_eq!(
            recon_exit_code(&ReconError::ConfigValidation("x".into())),
            EXIT_RECON_INVALID_CONFIG
        );
        assert_eq!(
            recon_exit_code(&ReconError::ConfigParse("x".into())),
            EXIT_RECON_INVALID_CONFIG
        );
        assert_eq!(recon_exit_code(&ReconError::Io("x".into())), EXIT_RECON_IO);
    }
}
