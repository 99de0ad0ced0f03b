use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::EvaluationError;
use crate::pipeline::extraction::{FieldValue, NormalizationKind, PatternRegistry};

// ═══════════════════════════════════════════
// What to evaluate
// ═══════════════════════════════════════════

/// How two values of a field are brought to a comparable form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonRule {
    /// Person-name stripping, then lower-case.
    Name,
    /// Remove spacing, commas, hyphens and unit suffixes, then lower-case.
    Plain,
}

impl ComparisonRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Plain => "plain",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatedField {
    pub name: String,
    pub rule: ComparisonRule,
    /// Yen-denominated field; reports carry man-yen auxiliary columns.
    #[serde(default)]
    pub currency: bool,
}

/// Ordered list of fields scored by an evaluation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationSpec {
    pub fields: Vec<EvaluatedField>,
}

impl EvaluationSpec {
    pub fn new(fields: Vec<EvaluatedField>) -> Self {
        Self { fields }
    }

    /// Every registry field, with the comparison rule implied by its kind.
    pub fn from_registry(registry: &PatternRegistry) -> Self {
        let fields = registry
            .fields()
            .iter()
            .map(|field| {
                let kind = field.primary_kind();
                EvaluatedField {
                    name: field.name.clone(),
                    rule: match kind {
                        Some(NormalizationKind::Name) => ComparisonRule::Name,
                        _ => ComparisonRule::Plain,
                    },
                    currency: kind == Some(NormalizationKind::Currency),
                }
            })
            .collect();
        Self { fields }
    }

    /// Keep only the named fields, in the order given.
    pub fn select(&self, names: &[String]) -> Result<Self, EvaluationError> {
        let fields = names
            .iter()
            .map(|name| {
                self.fields
                    .iter()
                    .find(|f| &f.name == name)
                    .cloned()
                    .ok_or_else(|| EvaluationError::UnknownField(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { fields })
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

// ═══════════════════════════════════════════
// Reference data
// ═══════════════════════════════════════════

/// Ground-truth values for one document. Absent or empty values are not scored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub id: String,
    pub values: BTreeMap<String, FieldValue>,
}

impl ReferenceRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.values
            .insert(field.into(), FieldValue::from_normalized(value.into()));
        self
    }
}

// ═══════════════════════════════════════════
// Report
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    Match,
    Mismatch,
    /// Reference value missing; not counted.
    Excluded,
}

impl CheckOutcome {
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Match => "✅",
            Self::Mismatch => "❌",
            Self::Excluded => "-",
        }
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// One field of one joined record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCheck {
    pub field: String,
    pub extracted: FieldValue,
    pub reference: FieldValue,
    pub outcome: CheckOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_man_yen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_man_yen: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordComparison {
    pub id: String,
    pub checks: Vec<FieldCheck>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Accuracy {
    pub total_checks: usize,
    pub total_correct: usize,
    pub accuracy_percent: f64,
}

impl Accuracy {
    pub fn from_counts(total_checks: usize, total_correct: usize) -> Self {
        let accuracy_percent = if total_checks == 0 {
            0.0
        } else {
            100.0 * total_correct as f64 / total_checks as f64
        };
        Self {
            total_checks,
            total_correct,
            accuracy_percent,
        }
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}% ({}/{})",
            self.accuracy_percent, self.total_correct, self.total_checks
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAccuracy {
    pub field: String,
    #[serde(flatten)]
    pub accuracy: Accuracy,
}

/// How the two record sets lined up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JoinStats {
    pub joined: usize,
    pub extracted_only: usize,
    pub reference_only: usize,
    /// Repeated ids across both inputs; the last occurrence was used.
    pub duplicate_ids: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub rows: Vec<RecordComparison>,
    pub summary: Accuracy,
    pub per_field: Vec<FieldAccuracy>,
    pub join: JoinStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::registry::*;

    #[test]
    fn spec_from_builtin_registry() {
        let registry = PatternRegistry::builtin().unwrap();
        let spec = EvaluationSpec::from_registry(&registry);

        assert_eq!(spec.fields.len(), registry.len());
        let name = spec.fields.iter().find(|f| f.name == FIELD_NAME).unwrap();
        assert_eq!(name.rule, ComparisonRule::Name);
        let rate = spec.fields.iter().find(|f| f.name == FIELD_RATE).unwrap();
        assert_eq!(rate.rule, ComparisonRule::Plain);
        assert!(rate.currency);
        assert_eq!(spec.fields.iter().filter(|f| f.currency).count(), 1);
    }

    #[test]
    fn select_keeps_given_order() {
        let spec = EvaluationSpec::from_registry(&PatternRegistry::builtin().unwrap());
        let selected = spec
            .select(&[FIELD_RATE.to_string(), FIELD_NAME.to_string()])
            .unwrap();
        assert_eq!(selected.field_names().collect::<Vec<_>>(), vec![FIELD_RATE, FIELD_NAME]);

        let err = spec.select(&["height".to_string()]).unwrap_err();
        assert!(matches!(err, EvaluationError::UnknownField(f) if f == "height"));
    }

    #[test]
    fn accuracy_with_no_checks_is_zero() {
        let acc = Accuracy::from_counts(0, 0);
        assert_eq!(acc.accuracy_percent, 0.0);
        assert_eq!(Accuracy::from_counts(60, 54).to_string(), "90.0% (54/60)");
    }

    #[test]
    fn outcome_markers() {
        assert_eq!(CheckOutcome::Match.marker(), "✅");
        assert_eq!(CheckOutcome::Mismatch.marker(), "❌");
        assert_eq!(CheckOutcome::Excluded.to_string(), "-");
    }

    #[test]
    fn field_accuracy_serializes_flat() {
        let json = serde_json::to_value(FieldAccuracy {
            field: "age".into(),
            accuracy: Accuracy::from_counts(4, 3),
        })
        .unwrap();
        assert_eq!(json["field"], "age");
        assert_eq!(json["total_checks"], 4);
        assert_eq!(json["accuracy_percent"], 75.0);
    }
}
