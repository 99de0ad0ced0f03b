use std::collections::BTreeMap;

use super::types::{round_one_decimal, ExtractedField};

/// Compute overall document confidence from per-field results.
///
/// Mean of the non-zero field scores, rounded to one decimal; 0 when no field matched.
pub fn compute_overall_confidence(fields: &BTreeMap<String, ExtractedField>) -> f64 {
    let scores: Vec<u32> = fields
        .values()
        .map(|f| f.confidence_score)
        .filter(|&s| s > 0)
        .collect();

    if scores.is_empty() {
        return 0.0;
    }

    let total: u64 = scores.iter().map(|&s| u64::from(s)).sum();
    round_one_decimal(total as f64 / scores.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::types::FieldValue;

    fn make_fields(scores: &[u32]) -> BTreeMap<String, ExtractedField> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &score)| {
                let value = if score > 0 {
                    FieldValue::Present(format!("v{i}"))
                } else {
                    FieldValue::Missing
                };
                (
                    format!("f{i}"),
                    ExtractedField {
                        value,
                        confidence_score: score,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn mean_ignores_unmatched_fields() {
        let conf = compute_overall_confidence(&make_fields(&[100, 80, 0, 0]));
        assert!((conf - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rounds_to_one_decimal() {
        let conf = compute_overall_confidence(&make_fields(&[100, 100, 60]));
        assert!((conf - 86.7).abs() < 1e-9, "got {conf}");
    }

    #[test]
    fn no_matches_returns_zero() {
        assert_eq!(compute_overall_confidence(&make_fields(&[0, 0])), 0.0);
        assert_eq!(compute_overall_confidence(&BTreeMap::new()), 0.0);
    }
}
