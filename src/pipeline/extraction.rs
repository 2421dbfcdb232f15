//! Batched extraction of tasks and ideas from documents.
//!
//! The extractor is an external collaborator (typically a hosted language
//! model) that may fail per request. A failed batch is logged, recorded,
//! and skipped; the remaining batches still run.

use crate::context::AppContext;
use crate::error::TopicaResult;
use crate::pipeline::progress::{ProgressSink, emit};
use crate::storage::{Document, DocumentStore};
use crate::types::{DocumentId, Phase};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use thiserror::Error;
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

const DEFAULT_BATCH_SIZE: usize = 10;
const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionKind {
    Task,
    Idea,
}

impl ExtractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Idea => "idea",
        }
    }
}

/// An actionable item found in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub document_id: DocumentId,
    pub kind: ExtractionKind,
    pub text: String,
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Extractor request failed: {0}\nSuggestion: The batch was skipped, re-run extraction later")]
    Request(String),

    #[error("Extractor returned an unusable response: {0}")]
    InvalidResponse(String),
}

/// Produces extractions for a batch of documents.
pub trait Extractor: Send + Sync {
    fn extract(&self, documents: &[Document]) -> Result<Vec<Extraction>, ExtractionError>;
}

/// A batch that was skipped because the extractor failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// Zero-based batch number.
    pub batch: usize,
    pub document_ids: Vec<DocumentId>,
    pub reason: String,
}

/// Items from successful batches plus every skipped batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport<T> {
    pub items: Vec<T>,
    pub failures: Vec<BatchFailure>,
    pub batches: usize,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            failures: Vec::new(),
            batches: 0,
        }
    }
}

impl<T> BatchReport<T> {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs an [`Extractor`] over documents in paced batches and stores the
/// results.
pub struct BatchExtraction {
    store: Arc<dyn DocumentStore>,
    extractor: Arc<dyn Extractor>,
    batch_size: usize,
    batch_delay: Duration,
}

impl BatchExtraction {
    pub fn new(store: Arc<dyn DocumentStore>, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            store,
            extractor,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
        }
    }

    /// Builds a pass from the context using the `[extraction]` settings.
    pub fn from_context(context: &AppContext, extractor: Arc<dyn Extractor>) -> Self {
        let config = &context.settings().extraction;
        Self::new(context.store(), extractor)
            .with_batch_size(config.batch_size)
            .with_batch_delay(Duration::from_millis(config.batch_delay_ms))
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Extracts from `documents` and saves what was found.
    ///
    /// Stored extractions of every document in a successful batch are
    /// replaced, so re-running over the same documents does not duplicate
    /// them. Documents in a failed batch keep what they had. Extractor
    /// failures never fail the pass; storage failures do.
    pub async fn run(
        &self,
        documents: Vec<Document>,
        progress: Option<&dyn ProgressSink>,
    ) -> TopicaResult<BatchReport<Extraction>> {
        let total = documents.len();
        let mut report = BatchReport::default();
        let mut analysed = Vec::with_capacity(total);
        let mut processed = 0;

        for (index, batch) in documents.chunks(self.batch_size).enumerate() {
            if index > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
            report.batches += 1;

            let extractor = Arc::clone(&self.extractor);
            let batch_docs = batch.to_vec();
            let outcome = spawn_blocking(move || extractor.extract(&batch_docs)).await;

            let reason = match outcome {
                Ok(Ok(extractions)) => {
                    report.items.extend(keep_batch_members(batch, extractions));
                    analysed.extend(batch.iter().map(|doc| doc.id));
                    None
                }
                Ok(Err(e)) => Some(e.to_string()),
                Err(e) => Some(format!("extractor panicked: {e}")),
            };

            if let Some(reason) = reason {
                warn!("Skipping extraction batch {}: {reason}", index + 1);
                report.failures.push(BatchFailure {
                    batch: index,
                    document_ids: batch.iter().map(|doc| doc.id).collect(),
                    reason,
                });
            }

            processed += batch.len();
            emit(progress, Phase::Analyzing, processed, total);
        }

        emit(progress, Phase::Saving, processed, total);
        let store = Arc::clone(&self.store);
        let items = report.items.clone();
        spawn_blocking(move || -> TopicaResult<()> {
            store.save_extractions(&analysed, &items)?;
            store.flush()?;
            Ok(())
        })
        .await??;

        emit(progress, Phase::Complete, total, total);
        info!(
            "Extracted {} items from {total} documents ({} of {} batches failed)",
            report.items.len(),
            report.failures.len(),
            report.batches
        );
        Ok(report)
    }
}

/// Drops extractions that point at documents outside the batch.
fn keep_batch_members(batch: &[Document], extractions: Vec<Extraction>) -> Vec<Extraction> {
    let members: HashSet<DocumentId> = batch.iter().map(|doc| doc.id).collect();
    extractions
        .into_iter()
        .filter(|extraction| {
            let known = members.contains(&extraction.document_id);
            if !known {
                warn!(
                    "Dropping extraction for document {} outside its batch",
                    extraction.document_id
                );
            }
            known
        })
        .collect()
}

static TASK_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:todo|task|action(?:\s+item)?)\b\s*[:\-]\s*(.+)$").expect("valid regex")
});

static IDEA_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:idea|what\s+if)\b\s*[:\-]?\s*(.+)$").expect("valid regex")
});

static SENTENCE_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\n.!?]+").expect("valid regex"));

/// Rule-based extractor for marked sentences.
///
/// `todo: ...`, `task: ...` and `action item: ...` become tasks; `idea: ...`
/// and `what if ...` become ideas.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternExtractor;

impl Extractor for PatternExtractor {
    fn extract(&self, documents: &[Document]) -> Result<Vec<Extraction>, ExtractionError> {
        let mut extractions = Vec::new();

        for doc in documents {
            for sentence in SENTENCE_SPLIT.split(&doc.text) {
                let found = if let Some(caps) = TASK_MARKER.captures(sentence) {
                    Some((ExtractionKind::Task, caps[1].trim().to_string()))
                } else {
                    IDEA_MARKER
                        .captures(sentence)
                        .map(|caps| (ExtractionKind::Idea, caps[1].trim().to_string()))
                };

                if let Some((kind, text)) = found.filter(|(_, text)| !text.is_empty()) {
                    extractions.push(Extraction {
                        document_id: doc.id,
                        kind,
                        text,
                    });
                }
            }
        }

        debug!(
            "Pattern extractor found {} items in {} documents",
            extractions.len(),
            documents.len()
        );
        Ok(extractions)
    }
}
