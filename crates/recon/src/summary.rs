use crate::model::{BatchSummary, LabelOutcome};

/// Compute summary statistics from label outcomes.
pub fn compute_summary(outcomes: &[LabelOutcome]) -> BatchSummary {
    let mut summary = BatchSummary {
        total_labels: outcomes.len(),
        ..BatchSummary::default()
    };

    for outcome in outcomes {
        match &outcome.result {
            Ok(record) => {
                summary.reconciled += 1;
                if record.is_empty() {
                    summary.empty += 1;
                }
                for key in record.keys() {
                    *summary.field_counts.entry(key.to_string()).or_insert(0) += 1;
                }
            }
            Err(e) => {
                summary.failed += 1;
                *summary.error_counts.entry(e.kind().to_string()).or_insert(0) += 1;
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Origin, ReconError};
    use crate::model::CanonicalRecord;

    fn ok(fields: &[(&str, &str)]) -> LabelOutcome {
        LabelOutcome {
            stem: "s".into(),
            result: Ok(fields.iter().copied().collect::<CanonicalRecord>()),
        }
    }

    fn failed(err: ReconError) -> LabelOutcome {
        LabelOutcome {
            stem: "s".into(),
            result: Err(err),
        }
    }

    #[test]
    fn summary_counts() {
        let outcomes = vec![
            ok(&[("dwc:country", "Peru"), ("dwc:sex", "female")]),
            ok(&[("dwc:country", "Chile")]),
            ok(&[]),
            failed(ReconError::DateParse {
                field: "dwc:eventDate".into(),
                origin: Origin::FreeForm,
                value: "x".into(),
            }),
            failed(ReconError::MisalignedLists {
                field: "dwc:eventDate".into(),
                dates: 2,
                verbatims: 1,
            }),
            failed(ReconError::DateParse {
                field: "dwc:eventDate".into(),
                origin: Origin::Structured,
                value: "y".into(),
            }),
        ];
        let summary = compute_summary(&outcomes);
        assert_eq!(summary.total_labels, 6);
        assert_eq!(summary.reconciled, 3);
        assert_eq!(summary.failed, 3);
        assert_eq!(summary.empty, 1);
        assert_eq!(summary.field_counts["dwc:country"], 2);
        assert_eq!(summary.field_counts["dwc:sex"], 1);
        assert_eq!(summary.error_counts["date_parse"], 2);
        assert_eq!(summary.error_counts["misaligned_lists"], 1);
    }
}
