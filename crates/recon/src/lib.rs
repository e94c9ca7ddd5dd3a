//! `labelrecon`: field-level reconciliation of specimen-label extractions.
//!
//! Pure engine crate: receives one label's rule-based and language-model
//! extractions, returns a single Darwin Core record. No CLI or IO
//! dependencies beyond reading a field table from disk.

pub mod alias;
pub mod audit;
pub mod config;
pub mod darwin_core;
pub mod date;
pub mod engine;
pub mod error;
pub mod model;
pub mod policy;
pub mod summary;
pub mod units;

pub use alias::{AliasIndex, AliasSet};
pub use config::{fixable_aliases, ReconConfig, Strategy};
pub use engine::Reconciler;
pub use error::{Origin, ReconError};
pub use model::{
    BatchSummary, CanonicalRecord, FreeFormRecord, LabelInput, LabelOutcome, StructuredRecord,
};
pub use summary::compute_summary;
pub use units::UnitTerms;
