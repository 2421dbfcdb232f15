use crate::pipeline::Extraction;
use crate::storage::{Document, DocumentStore, StorageError, StorageResult};
use crate::topics::Topic;
use crate::types::DocumentId;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// File name of the JSON snapshot inside the data directory.
pub const STORE_FILE_NAME: &str = "store.json";

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreSnapshot {
    version: u32,
    documents: Vec<Document>,
    #[serde(default)]
    topics: Vec<Topic>,
    #[serde(default)]
    extractions: Vec<Extraction>,
}

/// In-memory document store with an optional JSON snapshot.
///
/// Cloning is cheap and clones share the same data.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    documents: Arc<DashMap<DocumentId, Document>>,
    topics: Arc<RwLock<Vec<Topic>>>,
    extractions: Arc<RwLock<Vec<Extraction>>>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryStore {
    /// Creates an empty store that lives only in memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the snapshot at `path`, or starts empty when it does not exist.
    ///
    /// [`DocumentStore::flush`] writes back to the same path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut store = Self {
            snapshot_path: Some(path.clone()),
            ..Self::default()
        };

        if !path.exists() {
            debug!("No store snapshot at {}, starting empty", path.display());
            return Ok(store);
        }

        let json = std::fs::read_to_string(&path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&json)
            .map_err(|e| StorageError::Serialization(format!("Failed to parse snapshot: {e}")))?;

        if snapshot.version > SNAPSHOT_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: snapshot.version,
                supported: SNAPSHOT_VERSION,
            });
        }

        for document in snapshot.documents {
            store.documents.insert(document.id, document);
        }
        store.topics = Arc::new(RwLock::new(snapshot.topics));
        store.extractions = Arc::new(RwLock::new(snapshot.extractions));

        debug!(
            "Loaded {} documents from {}",
            store.documents.len(),
            path.display()
        );
        Ok(store)
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            version: SNAPSHOT_VERSION,
            documents: self.documents().unwrap_or_default(),
            topics: self.topics.read().clone(),
            extractions: self.extractions.read().clone(),
        }
    }
}

impl DocumentStore for MemoryStore {
    fn upsert_document(&self, document: Document) -> StorageResult<()> {
        let mut entry = self
            .documents
            .entry(document.id)
            .or_insert_with(|| document.clone());
        let existing = entry.value_mut();

        if existing.text != document.text {
            *existing = document;
        } else if document.vector.is_some() {
            existing.vector = document.vector;
        }

        Ok(())
    }

    fn document(&self, id: DocumentId) -> StorageResult<Option<Document>> {
        Ok(self.documents.get(&id).map(|entry| entry.clone()))
    }

    fn documents(&self) -> StorageResult<Vec<Document>> {
        let mut documents: Vec<Document> =
            self.documents.iter().map(|entry| entry.value().clone()).collect();
        documents.sort_by_key(|d| d.id);
        Ok(documents)
    }

    fn set_vector(&self, id: DocumentId, vector: Vec<f32>) -> StorageResult<()> {
        let mut entry = self
            .documents
            .get_mut(&id)
            .ok_or(StorageError::DocumentNotFound(id))?;
        entry.vector = Some(vector);
        Ok(())
    }

    fn set_cluster(&self, id: DocumentId, cluster: Option<usize>) -> StorageResult<()> {
        let mut entry = self
            .documents
            .get_mut(&id)
            .ok_or(StorageError::DocumentNotFound(id))?;
        entry.cluster = cluster;
        Ok(())
    }

    fn replace_topics(&self, topics: Vec<Topic>) -> StorageResult<()> {
        *self.topics.write() = topics;
        Ok(())
    }

    fn topics(&self) -> StorageResult<Vec<Topic>> {
        Ok(self.topics.read().clone())
    }

    fn save_extractions(
        &self,
        analysed: &[DocumentId],
        extractions: &[Extraction],
    ) -> StorageResult<()> {
        let analysed: HashSet<DocumentId> = analysed.iter().copied().collect();
        let mut stored = self.extractions.write();
        stored.retain(|extraction| !analysed.contains(&extraction.document_id));
        stored.extend_from_slice(extractions);
        Ok(())
    }

    fn extractions(&self) -> StorageResult<Vec<Extraction>> {
        Ok(self.extractions.read().clone())
    }

    fn flush(&self) -> StorageResult<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| StorageError::Serialization(format!("Failed to serialize store: {e}")))?;

        // Write then rename so a crash never leaves a truncated snapshot
        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, json)?;
        std::fs::rename(&temp_path, path)?;

        debug!("Wrote store snapshot to {}", path.display());
        Ok(())
    }
}
