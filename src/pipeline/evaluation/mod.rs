//! Evaluation Engine
//!
//! Scores a batch of extracted records against labelled reference records.
//!
//! ```text
//! extracted records ─┐
//!                    ├─ join by id → compare per field → EvaluationReport → table / JSON
//! reference records ─┘
//! ```

pub mod compare;
pub mod engine;
pub mod reference;
pub mod report;
pub mod types;

pub use compare::{comparison_key, man_yen};
pub use engine::evaluate;
pub use reference::{
    load_extracted_records, load_reference_records, parse_extracted_records,
    parse_reference_records,
};
pub use report::render_table;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid reference record {position}: {reason}")]
    InvalidReference { position: usize, reason: String },

    #[error("Invalid extracted record at line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },

    #[error("Unknown evaluation field: {0}")]
    UnknownField(String),
}
