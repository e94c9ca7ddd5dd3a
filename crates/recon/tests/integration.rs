use std::io::Write;
use std::path::PathBuf;

use labelrecon::audit::{audit_label, summarize};
use labelrecon::{
    compute_summary, fixable_aliases, FreeFormRecord, LabelInput, LabelOutcome, ReconConfig,
    Reconciler, StructuredRecord, UnitTerms,
};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_label(stem: &str) -> LabelInput {
    let dir = fixtures_dir();
    let read = |path: PathBuf| {
        std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
    };
    LabelInput {
        stem: stem.to_string(),
        structured: StructuredRecord::from_json_str(&read(dir.join(format!("structured/{stem}.json"))))
            .unwrap(),
        free_form: FreeFormRecord::from_json_str(&read(dir.join(format!("free_form/{stem}.json"))))
            .unwrap(),
        text: std::fs::read_to_string(dir.join(format!("text/{stem}.txt"))).unwrap_or_default(),
    }
}

fn run(stem: &str) -> LabelOutcome {
    Reconciler::builtin().unwrap().reconcile_label(&load_label(stem))
}

// -------------------------------------------------------------------------
// Builtin field table
// -------------------------------------------------------------------------

#[test]
fn label_with_roman_date_and_collector_number() {
    let record = run("label_001").result.unwrap();

    assert_eq!(record.get("dwc:country"), Some("Peru"));
    assert_eq!(record.get("dwc:stateProvince"), Some("Cusco"));
    assert_eq!(record.get("dwc:sex"), Some("female"));
    assert_eq!(record.get("dwc:recordedBy"), Some("J. Smith"));
    assert_eq!(record.get("dwc:recordNumber"), Some("1423"));
    assert_eq!(record.get("dwc:eventDate"), Some("3 March 1998"));
    assert_eq!(record.get("dwc:verbatimEventDate"), Some("3 III 1998"));
    assert_eq!(record.get("dwc:minimumElevationInMeters"), Some("1219.2"));
    // placeholder habitat is dropped
    assert!(!record.contains_key("dwc:habitat"));
    assert_eq!(record.len(), 8);
}

#[test]
fn label_with_labeled_and_confirmed_identifiers() {
    let record = run("label_002").result.unwrap();

    assert_eq!(record.get("dwc:accessionNumber"), Some("A123"));
    assert_eq!(record.get("dwc:recordNumber"), Some("4471"));
    assert_eq!(record.get("dwc:recordedBy"), Some("A. Jones | B. Lee"));
    assert_eq!(record.get("dwc:scientificName"), Some("Quercus alba"));
    assert_eq!(record.get("dwc:scientificNameAuthorship"), Some("L."));
    assert_eq!(record.get("dwc:locality"), Some("ridge above the river"));
    assert_eq!(record.len(), 6);
}

#[test]
fn bad_date_shape_fails_the_whole_label() {
    let outcome = run("label_003");
    assert_eq!(outcome.stem, "label_003");
    let err = outcome.result.unwrap_err();
    assert_eq!(err.kind(), "unrecognized_payload_shape");
}

#[test]
fn batch_summary() {
    let outcomes: Vec<LabelOutcome> = ["label_001", "label_002", "label_003"]
        .into_iter()
        .map(run)
        .collect();
    let summary = compute_summary(&outcomes);

    assert_eq!(summary.total_labels, 3);
    assert_eq!(summary.reconciled, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.empty, 0);
    assert_eq!(summary.field_counts["dwc:recordedBy"], 2);
    assert_eq!(summary.field_counts["dwc:eventDate"], 1);
    assert_eq!(summary.error_counts["unrecognized_payload_shape"], 1);
}

#[test]
fn reconciliation_is_deterministic() {
    let input = load_label("label_002");
    let reconciler = Reconciler::builtin().unwrap();
    let first = reconciler.reconcile_label(&input).result.unwrap();
    for _ in 0..5 {
        assert_eq!(reconciler.reconcile_label(&input).result.unwrap(), first);
    }
}

// -------------------------------------------------------------------------
// Custom field tables
// -------------------------------------------------------------------------

#[test]
fn custom_table_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[[field]]
label = "dwc:country"
strategy = "free_form"

[[field]]
label = "dwc:sex"
synonyms = ["sex"]
strategy = "free_form"
"#
    )
    .unwrap();

    let config = ReconConfig::from_file(file.path()).unwrap();
    let reconciler = Reconciler::new(config, UnitTerms::builtin().unwrap()).unwrap();
    let record = reconciler.reconcile_label(&load_label("label_001")).result.unwrap();

    // free-form wins outright under this table
    assert_eq!(record.get("dwc:sex"), Some("female, lactating"));
    assert_eq!(record.get("dwc:country"), Some("Peru"));
    assert_eq!(record.len(), 2);
}

#[test]
fn missing_table_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ReconConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert_eq!(err.kind(), "io");
}

// -------------------------------------------------------------------------
// Key audit
// -------------------------------------------------------------------------

#[test]
fn audit_fixture_labels() {
    let fixable = fixable_aliases(&ReconConfig::builtin().unwrap());
    let dir = fixtures_dir();

    let mut audits = Vec::new();
    for stem in ["label_001", "label_002", "label_003"] {
        let raw = std::fs::read_to_string(dir.join(format!("free_form/{stem}.json"))).unwrap();
        let clean = std::fs::read_to_string(dir.join(format!("clean/{stem}.json"))).ok();
        audits.push(audit_label(stem, &raw, clean.as_deref(), &fixable).unwrap());
    }

    assert!(!audits[0].bad_json);
    assert_eq!(
        audits[0].fixed_terms,
        ["dwc:collectionDate", "dwc:elevation"]
    );
    assert!(audits[1].bad_json);
    assert!(audits[1].bad_terms.contains(&"dwc:favoriteColor".to_string()));
    assert!(audits[2].missing_file);

    let summary = summarize(&audits);
    assert_eq!(summary.total_labels, 3);
    assert_eq!(summary.missing_files, 1);
    assert_eq!(summary.bad_json_files, 1);
    assert_eq!(summary.labels_with_fixed_terms, 2);
}
