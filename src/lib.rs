//! Unsupervised topic discovery and hybrid search over short text documents.
//!
//! Documents are embedded into dense vectors, grouped into topics with
//! k-means (k chosen by the elbow heuristic unless configured), and
//! retrieved by fusing cosine similarity with BM25 keyword matches.

pub mod config;
pub mod context;
pub mod display;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod search;
pub mod storage;
pub mod topics;
pub mod types;
pub mod vector;

// Explicit exports for better API clarity
pub use config::Settings;
pub use context::AppContext;
pub use error::{TopicaError, TopicaResult};
pub use pipeline::{
    BatchExtraction, BatchReport, EmbedStats, EmbeddingPass, Extraction, ExtractionKind,
    Extractor, ProgressEvent, ProgressSink,
};
pub use search::{
    HybridSearchEngine, HybridSearchOutput, LexicalIndex, LexicalOutcome, SearchResult,
    TantivyLexicalIndex,
};
pub use storage::{Document, DocumentStore, MemoryStore, StorageError, StorageResult};
pub use topics::{ClusteringReport, Topic, TopicBuilder};
pub use types::{DocumentId, Phase, TopicId};
pub use vector::{
    ClusterResult, ClusteringError, EmbeddingGenerator, FastEmbedGenerator, VectorError,
    cluster, cosine_similarity, suggest_k,
};
