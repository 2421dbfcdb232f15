#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use topica::pipeline::{ProgressEvent, ProgressSink};
use topica::search::{LexicalIndex, TantivyLexicalIndex};
use topica::storage::{Document, DocumentStore, MemoryStore, StorageError, StorageResult};
use topica::vector::{EmbeddingGenerator, VectorDimension, VectorError};
use topica::{AppContext, DocumentId, Phase, Settings};

pub const TEST_DIMENSION: usize = 32;

/// Bag-of-words embedder: each lowercase word lands in a hashed bucket.
///
/// Texts sharing words get similar vectors, which is all the tests need.
pub struct HashEmbedder {
    calls: AtomicUsize,
    fail_from_call: Option<usize>,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_from_call: None,
        }
    }

    /// Fails on the given (1-based) call and every call after it.
    pub fn failing_from(call: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_from_call: Some(call),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector_for(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; TEST_DIMENSION];
        for word in text.split_whitespace() {
            let word = word
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if word.is_empty() {
                continue;
            }
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            vector[(hasher.finish() % TEST_DIMENSION as u64) as usize] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

impl EmbeddingGenerator for HashEmbedder {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_from_call.is_some_and(|from| call >= from) {
            return Err(VectorError::EmbeddingFailed(format!(
                "provider rejected call {call}"
            )));
        }
        Ok(texts.iter().map(|text| Self::vector_for(text)).collect())
    }

    fn dimension(&self) -> VectorDimension {
        VectorDimension::new(TEST_DIMENSION).expect("non-zero dimension")
    }
}

/// Two-axis embedder: programming words on one axis, baking words on the
/// other. Gives clusters that are separated by construction.
pub struct ThemeEmbedder;

impl ThemeEmbedder {
    const PROGRAMMING: &'static [&'static str] = &["rust", "borrow", "compiler", "lifetimes"];
    const BAKING: &'static [&'static str] = &["sourdough", "bread", "starter", "baking"];
}

impl EmbeddingGenerator for ThemeEmbedder {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        Ok(texts
            .iter()
            .map(|text| {
                let count = |vocabulary: &[&str]| {
                    text.split_whitespace()
                        .filter(|word| vocabulary.contains(&word.to_lowercase().as_str()))
                        .count() as f32
                };
                vec![count(Self::PROGRAMMING), count(Self::BAKING)]
            })
            .collect())
    }

    fn dimension(&self) -> VectorDimension {
        VectorDimension::new(2).expect("non-zero dimension")
    }
}

/// Lexical index whose searches always fail.
pub struct FailingLexicalIndex;

impl LexicalIndex for FailingLexicalIndex {
    fn search(&self, _query: &str, _limit: usize) -> StorageResult<Vec<(DocumentId, f32)>> {
        Err(StorageError::TantivyOperation {
            operation: "search".to_string(),
            cause: "index is locked by another process".to_string(),
        })
    }

    fn reindex(&self, _id: DocumentId, _text: &str) -> StorageResult<()> {
        Ok(())
    }

    fn commit(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Collects every progress event.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.events().iter().map(|e| e.phase).collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Settings with no pacing delays and a fixed seed.
pub fn fast_settings() -> Settings {
    let mut settings = Settings::default();
    settings.embedding.batch_size = 4;
    settings.embedding.batch_delay_ms = 0;
    settings.extraction.batch_size = 3;
    settings.extraction.batch_delay_ms = 0;
    settings.clustering.seed = Some(42);
    settings
}

/// Context backed by an in-memory store and tantivy index.
pub fn memory_context(settings: Settings, embedder: Arc<dyn EmbeddingGenerator>) -> AppContext {
    AppContext::new(
        settings,
        Arc::new(MemoryStore::new()),
        Arc::new(TantivyLexicalIndex::in_memory().expect("in-memory index")),
    )
    .with_embedder(embedder)
}

/// Inserts documents with ids starting at 1.
pub fn seed_documents(store: &dyn DocumentStore, texts: &[&str]) -> Vec<DocumentId> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let id = DocumentId(i as u64 + 1);
            store
                .upsert_document(Document::new(id, *text))
                .expect("upsert");
            id
        })
        .collect()
}

pub mod corpus {
    /// Two clearly separated themes.
    pub const NOTES: &[&str] = &[
        "rust borrow checker rejects my code",
        "rust borrow checker lifetimes again",
        "rust compiler borrow error explained",
        "rust lifetimes and the borrow checker",
        "sourdough bread starter feeding schedule",
        "sourdough bread hydration percentage",
        "baking sourdough bread at home",
        "sourdough starter smells like bread",
    ];
}
