//! Batch runner: processes many documents on a bounded pool of threads.
//!
//! Each document is isolated: a document with no id, or one whose processing
//! panics, is reported as skipped and the rest of the batch continues.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::types::{
    BatchConfig, BatchResult, BatchStatusEvent, BatchSummary, SkipReason, SkippedDocument,
};
use crate::pipeline::extraction::{DocumentProcessor, ExtractedRecord, RawDocument};

/// Callback invoked with batch progress events. Called from worker threads.
pub type ProgressFn<'a> = &'a (dyn Fn(BatchStatusEvent) + Sync);

/// Runs a [`DocumentProcessor`] over a document set.
pub struct BatchRunner {
    processor: Arc<dyn DocumentProcessor>,
    config: BatchConfig,
}

impl BatchRunner {
    pub fn new(processor: Arc<dyn DocumentProcessor>, config: BatchConfig) -> Self {
        Self { processor, config }
    }

    /// Number of worker threads a run of `document_count` documents will use.
    pub fn worker_count(&self, document_count: usize) -> usize {
        self.config.workers.max(1).min(document_count.max(1))
    }

    /// Process every document. Records come back in input order.
    pub fn run(&self, documents: &[RawDocument]) -> BatchResult {
        self.run_with_progress(documents, None)
    }

    pub fn run_with_progress(
        &self,
        documents: &[RawDocument],
        progress: Option<ProgressFn<'_>>,
    ) -> BatchResult {
        let batch_id = new_batch_id();
        let started_at = Utc::now();
        let start = std::time::Instant::now();
        let total = documents.len();
        let workers = self.worker_count(total);

        tracing::info!(
            batch_id = %batch_id,
            documents = total,
            workers,
            "Starting extraction batch"
        );
        emit(progress, BatchStatusEvent::Started { document_count: total });

        let outcomes = self.process_all(documents, workers, total, progress);

        let mut records = Vec::with_capacity(total);
        let mut skipped = Vec::new();
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Some(Ok(record)) => records.push(record),
                Some(Err(reason)) => skipped.push(skip(documents, index, reason)),
                None => skipped.push(skip(documents, index, SkipReason::WorkerLost)),
            }
        }

        for doc in &skipped {
            tracing::warn!(
                batch_id = %batch_id,
                index = doc.index,
                document_id = doc.id.as_str(),
                reason = %doc.reason,
                "Document skipped"
            );
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        let summary = BatchSummary {
            batch_id,
            started_at,
            attempted: total,
            succeeded: records.len(),
            skipped: skipped.len(),
            duration_ms,
        };

        tracing::info!(
            batch_id = %summary.batch_id,
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            duration_ms,
            "Extraction batch complete"
        );
        emit(
            progress,
            BatchStatusEvent::Completed {
                succeeded: summary.succeeded,
                skipped: summary.skipped,
                duration_ms,
            },
        );

        BatchResult {
            records,
            skipped,
            summary,
        }
    }

    /// Fan documents out across `workers` threads (worker `w` takes indices
    /// `w, w + workers, ...`) and gather outcomes by input index.
    fn process_all(
        &self,
        documents: &[RawDocument],
        workers: usize,
        total: usize,
        progress: Option<ProgressFn<'_>>,
    ) -> Vec<Option<Result<ExtractedRecord, SkipReason>>> {
        let mut outcomes: Vec<Option<Result<ExtractedRecord, SkipReason>>> =
            (0..total).map(|_| None).collect();
        if total == 0 {
            return outcomes;
        }

        let completed = AtomicUsize::new(0);
        let processor = self.processor.as_ref();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    let completed = &completed;
                    scope.spawn(move || {
                        documents
                            .iter()
                            .enumerate()
                            .skip(worker)
                            .step_by(workers)
                            .map(|(index, document)| {
                                let outcome = process_one(processor, document);
                                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                                emit(progress, BatchStatusEvent::Progress { completed: done, total });
                                (index, outcome)
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            for (worker, handle) in handles.into_iter().enumerate() {
                match handle.join() {
                    Ok(results) => {
                        for (index, outcome) in results {
                            outcomes[index] = Some(outcome);
                        }
                    }
                    Err(_) => {
                        tracing::error!(worker, "Extraction worker thread terminated");
                    }
                }
            }
        });

        outcomes
    }
}

/// Process a single document, converting a panic into a skip reason.
fn process_one(
    processor: &dyn DocumentProcessor,
    document: &RawDocument,
) -> Result<ExtractedRecord, SkipReason> {
    if document.id.trim().is_empty() {
        return Err(SkipReason::MissingId);
    }
    catch_unwind(AssertUnwindSafe(|| processor.process(document)))
        .map_err(|payload| SkipReason::Panicked(panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn skip(documents: &[RawDocument], index: usize, reason: SkipReason) -> SkippedDocument {
    SkippedDocument {
        index,
        id: documents[index].id.clone(),
        reason,
    }
}

fn emit(progress: Option<ProgressFn<'_>>, event: BatchStatusEvent) {
    if let Some(f) = progress {
        f(event);
    }
}

/// Generate a new batch ID (UUID v4).
pub fn new_batch_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
