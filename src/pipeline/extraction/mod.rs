pub mod types;
pub mod normalize;
pub mod registry;
pub mod field;
pub mod keywords;
pub mod sanitize;
pub mod confidence;
pub mod orchestrator;

pub use types::*;
pub use normalize::{normalize, NormalizationKind};
pub use registry::{FieldSpec, PatternRegistry, PatternSpec};
pub use field::{extract, extract_field};
pub use keywords::{KeywordGroup, ProcessKeywords};
pub use confidence::*;
pub use orchestrator::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid pattern for field '{field}': {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed input at line {line}: {reason}")]
    MalformedInput { line: usize, reason: String },
}
