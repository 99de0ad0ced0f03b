use std::collections::BTreeMap;

use super::compare::{comparison_key, man_yen};
use super::types::{
    Accuracy, CheckOutcome, EvaluatedField, EvaluationReport, EvaluationSpec, FieldAccuracy,
    FieldCheck, JoinStats, RecordComparison, ReferenceRecord,
};
use crate::pipeline::extraction::{ExtractedRecord, FieldValue, MISSING};

/// Score extracted records against reference records.
///
/// Records are inner-joined by id; rows come back ordered by id. A reference
/// value that is missing or blank excludes that field of that record from
/// scoring. Never fails: no joined records yields an empty report.
pub fn evaluate(
    extracted: &[ExtractedRecord],
    reference: &[ReferenceRecord],
    spec: &EvaluationSpec,
) -> EvaluationReport {
    let mut duplicate_ids = 0;
    let extracted_by_id = index_by_id(extracted, |r| r.id.as_str(), &mut duplicate_ids);
    let reference_by_id = index_by_id(reference, |r| r.id.as_str(), &mut duplicate_ids);

    let mut tallies = vec![(0usize, 0usize); spec.fields.len()];
    let mut rows = Vec::new();

    for (id, extracted_record) in &extracted_by_id {
        let Some(reference_record) = reference_by_id.get(id) else {
            continue;
        };
        let checks = spec
            .fields
            .iter()
            .zip(tallies.iter_mut())
            .map(|(field, (checks, correct))| {
                let check = check_field(field, extracted_record, reference_record);
                match check.outcome {
                    CheckOutcome::Match => {
                        *checks += 1;
                        *correct += 1;
                    }
                    CheckOutcome::Mismatch => *checks += 1,
                    CheckOutcome::Excluded => {}
                }
                check
            })
            .collect();
        rows.push(RecordComparison {
            id: (*id).to_string(),
            checks,
        });
    }

    let joined = rows.len();
    let join = JoinStats {
        joined,
        extracted_only: extracted_by_id.len() - joined,
        reference_only: reference_by_id.len() - joined,
        duplicate_ids,
    };

    let per_field: Vec<FieldAccuracy> = spec
        .fields
        .iter()
        .zip(&tallies)
        .map(|(field, &(checks, correct))| FieldAccuracy {
            field: field.name.clone(),
            accuracy: Accuracy::from_counts(checks, correct),
        })
        .collect();

    let summary = Accuracy::from_counts(
        tallies.iter().map(|(c, _)| c).sum(),
        tallies.iter().map(|(_, c)| c).sum(),
    );

    if joined == 0 {
        tracing::warn!(
            extracted = extracted.len(),
            reference = reference.len(),
            "No records joined; evaluation report is empty"
        );
    }
    tracing::info!(
        joined = join.joined,
        extracted_only = join.extracted_only,
        reference_only = join.reference_only,
        duplicate_ids = join.duplicate_ids,
        total_checks = summary.total_checks,
        total_correct = summary.total_correct,
        accuracy_percent = summary.accuracy_percent,
        "Evaluation complete"
    );

    EvaluationReport {
        rows,
        summary,
        per_field,
        join,
    }
}

/// Map records by trimmed id, the last occurrence winning. Counts repeats into
/// `duplicates`. Reference ids are trimmed at load, so both sides key alike.
fn index_by_id<'a, T>(
    records: &'a [T],
    id: impl Fn(&'a T) -> &'a str,
    duplicates: &mut usize,
) -> BTreeMap<&'a str, &'a T> {
    let mut by_id = BTreeMap::new();
    for record in records {
        let key = id(record).trim();
        if by_id.insert(key, record).is_some() {
            *duplicates += 1;
            tracing::debug!(id = key, "Duplicate record id; keeping last occurrence");
        }
    }
    by_id
}

fn check_field(
    field: &EvaluatedField,
    extracted: &ExtractedRecord,
    reference: &ReferenceRecord,
) -> FieldCheck {
    let extracted_value = extracted.value(&field.name).clone();
    let reference_value = reference
        .values
        .get(&field.name)
        .cloned()
        .unwrap_or(FieldValue::Missing);

    let outcome = match scored_reference(&reference_value) {
        None => CheckOutcome::Excluded,
        Some(expected) => {
            let actual = comparison_key(extracted_value.as_str(), field.rule);
            if actual == comparison_key(expected, field.rule) {
                CheckOutcome::Match
            } else {
                CheckOutcome::Mismatch
            }
        }
    };

    let (extracted_man_yen, reference_man_yen) = if field.currency {
        (man_yen(&extracted_value), man_yen(&reference_value))
    } else {
        (None, None)
    };

    FieldCheck {
        field: field.name.clone(),
        extracted: extracted_value,
        reference: reference_value,
        outcome,
        extracted_man_yen,
        reference_man_yen,
    }
}

/// Reference text that counts toward scoring, if any.
fn scored_reference(value: &FieldValue) -> Option<&str> {
    value
        .present()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(MISSING))
}
