//! Loading reference and extracted record sets from disk.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use super::types::ReferenceRecord;
use super::EvaluationError;
use crate::pipeline::extraction::{ExtractedRecord, FieldValue};

/// Load reference records from a JSON array or JSON Lines file.
///
/// Each record is a flat object with an `id` and one value per field. Any
/// malformed record fails the whole load.
pub fn load_reference_records(path: &Path) -> Result<Vec<ReferenceRecord>, EvaluationError> {
    let text = std::fs::read_to_string(path)?;
    let records = parse_reference_records(&text)?;
    tracing::info!(path = %path.display(), records = records.len(), "Loaded reference records");
    Ok(records)
}

/// Parse reference records. Positions in errors are 1-based array indices
/// for array input and line numbers for JSON Lines.
pub fn parse_reference_records(text: &str) -> Result<Vec<ReferenceRecord>, EvaluationError> {
    if text.trim_start().starts_with('[') {
        let values: Vec<Value> =
            serde_json::from_str(text).map_err(|e| EvaluationError::InvalidReference {
                position: e.line(),
                reason: e.to_string(),
            })?;
        values
            .into_iter()
            .enumerate()
            .map(|(i, value)| reference_from_value(i + 1, value))
            .collect()
    } else {
        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                let value = serde_json::from_str::<Value>(line).map_err(|e| {
                    EvaluationError::InvalidReference {
                        position: i + 1,
                        reason: e.to_string(),
                    }
                })?;
                reference_from_value(i + 1, value)
            })
            .collect()
    }
}

fn reference_from_value(position: usize, value: Value) -> Result<ReferenceRecord, EvaluationError> {
    let invalid = |reason: String| EvaluationError::InvalidReference { position, reason };

    let Value::Object(map) = value else {
        return Err(invalid("expected a JSON object".to_string()));
    };

    let mut id = None;
    let mut values = BTreeMap::new();
    for (key, value) in map {
        if key == "id" {
            id = Some(match value {
                Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                other => return Err(invalid(format!("id must be a non-empty string or number, got {other}"))),
            });
            continue;
        }
        let field_value = match value {
            Value::Null => FieldValue::Missing,
            Value::String(s) => FieldValue::from_normalized(s),
            Value::Number(n) => FieldValue::from_normalized(n.to_string()),
            other => {
                return Err(invalid(format!(
                    "value of '{key}' must be a string, number or null, got {other}"
                )))
            }
        };
        values.insert(key, field_value);
    }

    let id = id.ok_or_else(|| invalid("missing id".to_string()))?;
    Ok(ReferenceRecord { id, values })
}

/// Load extracted records written by the batch runner (JSON Lines).
pub fn load_extracted_records(path: &Path) -> Result<Vec<ExtractedRecord>, EvaluationError> {
    let text = std::fs::read_to_string(path)?;
    let records = parse_extracted_records(&text)?;
    tracing::info!(path = %path.display(), records = records.len(), "Loaded extracted records");
    Ok(records)
}

pub fn parse_extracted_records(text: &str) -> Result<Vec<ExtractedRecord>, EvaluationError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<ExtractedRecord>(line).map_err(|e| {
                EvaluationError::InvalidRecord {
                    line: i + 1,
                    reason: e.to_string(),
                }
            })
        })
        .collect()
}
