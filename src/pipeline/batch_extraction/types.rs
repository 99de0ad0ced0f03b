//! Core types for batch extraction over many documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pipeline::extraction::ExtractedRecord;

// ═══════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Upper bound on concurrent worker threads (at least 1).
    pub workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

// ═══════════════════════════════════════════
// Skipped documents
// ═══════════════════════════════════════════

/// Why a document produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    MissingId,
    Panicked(String),
    WorkerLost,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId => write!(f, "missing id"),
            Self::Panicked(msg) => write!(f, "panicked: {msg}"),
            Self::WorkerLost => write!(f, "worker thread lost"),
        }
    }
}

/// A document isolated from the batch, with its position in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub index: usize,
    pub id: String,
    pub reason: SkipReason,
}

// ═══════════════════════════════════════════
// Batch Result (output of BatchRunner)
// ═══════════════════════════════════════════

/// Counts reported for every batch: attempted vs. succeeded vs. skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: String,
    pub started_at: DateTime<Utc>,
    pub attempted: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub duration_ms: u64,
}

/// Result of running a full extraction batch. Records keep input order.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub records: Vec<ExtractedRecord>,
    pub skipped: Vec<SkippedDocument>,
    pub summary: BatchSummary,
}

// ═══════════════════════════════════════════
// Batch Status Events
// ═══════════════════════════════════════════

/// Event emitted during batch processing for progress reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BatchStatusEvent {
    Started {
        document_count: usize,
    },
    Progress {
        completed: usize,
        total: usize,
    },
    Completed {
        succeeded: usize,
        skipped: usize,
        duration_ms: u64,
    },
}
