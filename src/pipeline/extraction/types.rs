use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Literal used at the record boundary for a field with no valid value.
pub const MISSING: &str = "N/A";

// ═══════════════════════════════════════════
// Input document
// ═══════════════════════════════════════════

/// A single document handed over by the document source.
///
/// The extraction core never mutates it; subject and attachment text are
/// optional and treated as empty when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    #[serde(default)]
    pub subject: String,
    pub body_text: String,
    #[serde(default)]
    pub attachment_text: Option<String>,
}

impl RawDocument {
    pub fn new(id: impl Into<String>, body_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body_text: body_text.into(),
            ..Default::default()
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_attachment(mut self, text: impl Into<String>) -> Self {
        self.attachment_text = Some(text.into());
        self
    }

    /// Subject, body and attachment text joined with newlines, skipping empty parts.
    pub fn combined_text(&self) -> String {
        [
            self.subject.as_str(),
            self.body_text.as_str(),
            self.attachment_text.as_deref().unwrap_or(""),
        ]
        .iter()
        .filter(|part| !part.trim().is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
    }
}

// ═══════════════════════════════════════════
// Field values
// ═══════════════════════════════════════════

/// A normalized field value, or the canonical "no value" state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FieldValue {
    Present(String),
    #[default]
    Missing,
}

impl FieldValue {
    /// Wrap a normalized string; empty strings and the sentinel become `Missing`.
    pub fn from_normalized(value: String) -> Self {
        if value.is_empty() || value == MISSING {
            Self::Missing
        } else {
            Self::Present(value)
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Present(v) => v,
            Self::Missing => MISSING,
        }
    }

    pub fn present(&self) -> Option<&str> {
        match self {
            Self::Present(v) => Some(v),
            Self::Missing => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        match value {
            None | Some(serde_json::Value::Null) => Ok(Self::Missing),
            Some(serde_json::Value::String(s)) => Ok(Self::from_normalized(s)),
            Some(serde_json::Value::Number(n)) => Ok(Self::from_normalized(n.to_string())),
            Some(other) => Err(de::Error::custom(format!(
                "field value must be a string, number or null, got {other}"
            ))),
        }
    }
}

/// Outcome of extracting one field from one document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtractedField {
    pub value: FieldValue,
    /// Score of the winning pattern; 0 when nothing was accepted.
    pub confidence_score: u32,
}

impl ExtractedField {
    pub fn missing() -> Self {
        Self::default()
    }
}

// ═══════════════════════════════════════════
// Extracted record (output of the document pipeline)
// ═══════════════════════════════════════════

/// Structured record produced once per document.
///
/// Every registered field is present; unmatched fields hold `Missing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub id: String,
    pub fields: BTreeMap<String, ExtractedField>,
    #[serde(default)]
    pub process_flags: BTreeMap<String, bool>,
    #[serde(serialize_with = "serialize_one_decimal")]
    pub overall_confidence: f64,
}

impl ExtractedRecord {
    pub fn value(&self, field: &str) -> &FieldValue {
        static ABSENT: FieldValue = FieldValue::Missing;
        self.fields.get(field).map(|f| &f.value).unwrap_or(&ABSENT)
    }

    pub fn flag(&self, group: &str) -> bool {
        self.process_flags.get(group).copied().unwrap_or(false)
    }
}

// ═══════════════════════════════════════════
// Processing seam
// ═══════════════════════════════════════════

/// Turns one document into one record. Implementations read only immutable
/// configuration, so a single instance may serve concurrent workers.
pub trait DocumentProcessor: Send + Sync {
    fn process(&self, document: &RawDocument) -> ExtractedRecord;
}

/// Round to one decimal place, the precision the record boundary exposes.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn serialize_one_decimal<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_one_decimal(*value))
}
