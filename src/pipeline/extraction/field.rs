//! Field extractor: best-candidate selection across one field's patterns.
//!
//! Patterns are tried in registry order with an explicit best-so-far state:
//! - a pattern whose score cannot beat an accepted value is skipped
//!   (equal scores keep the earlier match)
//! - a higher-scoring later pattern overrides a weaker accepted value
//! - a match that normalization rejects is never accepted, so a later
//!   lower-scoring pattern may still win

use super::normalize::normalize;
use super::registry::{CompiledField, PatternRegistry};
use super::types::{ExtractedField, FieldValue};
use super::ExtractionError;

/// Extract one field from `search_text`.
pub fn extract(field: &CompiledField, search_text: &str) -> ExtractedField {
    let mut best_value = FieldValue::Missing;
    let mut best_score = 0u32;

    for (index, pattern) in field.patterns.iter().enumerate() {
        if !best_value.is_missing() && best_score >= pattern.score {
            continue;
        }

        let Some(captures) = pattern.regex.captures(search_text) else {
            continue;
        };

        let raw = captures
            .get(1)
            .or_else(|| captures.get(0))
            .map(|m| m.as_str())
            .unwrap_or_default();

        let candidate = normalize(raw, pattern.kind);
        if candidate.is_missing() {
            tracing::debug!(
                field = field.name.as_str(),
                pattern = index,
                score = pattern.score,
                "Match rejected by normalization"
            );
            continue;
        }

        if best_value.is_missing() || pattern.score > best_score {
            tracing::debug!(
                field = field.name.as_str(),
                pattern = index,
                score = pattern.score,
                previous_score = best_score,
                "Candidate accepted"
            );
            best_value = candidate;
            best_score = pattern.score;
        }
    }

    let confidence_score = if best_value.is_missing() { 0 } else { best_score };
    ExtractedField {
        value: best_value,
        confidence_score,
    }
}

/// Extract a field by name; an unregistered name is a configuration error.
pub fn extract_field(
    registry: &PatternRegistry,
    field_name: &str,
    search_text: &str,
) -> Result<ExtractedField, ExtractionError> {
    let field = registry.resolve(field_name)?;
    Ok(extract(field, search_text))
}
