//! Persistence boundary for documents, vectors, topics, and extractions.
//!
//! The clustering and search code talks to storage only through the
//! [`DocumentStore`] trait. [`MemoryStore`] is the bundled implementation:
//! an in-memory store with an optional JSON snapshot on disk.

mod error;
mod memory;

pub use error::{StorageError, StorageResult};
pub use memory::{MemoryStore, STORE_FILE_NAME};

use crate::pipeline::Extraction;
use crate::topics::Topic;
use crate::types::DocumentId;
use serde::{Deserialize, Serialize};

/// A short text document, optionally embedded and assigned to a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,

    /// Raw text, never modified by clustering or search.
    pub text: String,

    /// Embedding of `text`, once generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,

    /// Cluster id from the most recent clustering run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<usize>,
}

impl Document {
    pub fn new(id: DocumentId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            vector: None,
            cluster: None,
        }
    }

    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }

    pub fn has_vector(&self) -> bool {
        self.vector.is_some()
    }
}

/// Storage operations required by the embedding, clustering, and search
/// passes.
///
/// Implementations must be safe to share between threads; each call is
/// independent and carries no ordering guarantee relative to other calls.
pub trait DocumentStore: Send + Sync {
    /// Inserts a document or replaces its text.
    ///
    /// When the text of an existing document is unchanged its vector and
    /// cluster are kept; a changed text drops both so the document is
    /// embedded again.
    fn upsert_document(&self, document: Document) -> StorageResult<()>;

    /// Looks up a single document.
    fn document(&self, id: DocumentId) -> StorageResult<Option<Document>>;

    /// All documents ordered by id.
    fn documents(&self) -> StorageResult<Vec<Document>>;

    /// Documents that already have a vector, ordered by id.
    fn documents_with_vectors(&self) -> StorageResult<Vec<Document>> {
        Ok(self
            .documents()?
            .into_iter()
            .filter(Document::has_vector)
            .collect())
    }

    /// Documents still waiting for a vector, ordered by id.
    fn documents_without_vectors(&self) -> StorageResult<Vec<Document>> {
        Ok(self
            .documents()?
            .into_iter()
            .filter(|d| !d.has_vector())
            .collect())
    }

    /// Stores the vector for a document.
    fn set_vector(&self, id: DocumentId, vector: Vec<f32>) -> StorageResult<()>;

    /// Updates the cluster a document was assigned to.
    fn set_cluster(&self, id: DocumentId, cluster: Option<usize>) -> StorageResult<()>;

    /// Deletes every topic (and its document links) and stores `topics`.
    fn replace_topics(&self, topics: Vec<Topic>) -> StorageResult<()>;

    /// All topics from the latest clustering run.
    fn topics(&self) -> StorageResult<Vec<Topic>>;

    /// Replaces the extractions of every document in `analysed` with
    /// `extractions`. Extractions of other documents are left alone.
    fn save_extractions(
        &self,
        analysed: &[DocumentId],
        extractions: &[Extraction],
    ) -> StorageResult<()>;

    /// All stored extractions.
    fn extractions(&self) -> StorageResult<Vec<Extraction>>;

    /// Makes pending changes durable. No-op for purely in-memory stores.
    fn flush(&self) -> StorageResult<()> {
        Ok(())
    }
}
