//! Batch Extraction
//!
//! Runs the document pipeline over a whole document set on a bounded pool of
//! worker threads. A document that fails is reported as skipped; it never
//! aborts the batch.
//!
//! ```text
//! JSONL documents → BatchRunner (N workers × DocumentProcessor) → JSONL records
//! ```

pub mod io;
pub mod runner;
pub mod types;

pub use io::{load_documents, parse_documents, save_records, write_records};
pub use runner::{new_batch_id, BatchRunner, ProgressFn};
pub use types::*;
