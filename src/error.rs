//! Error types for topic discovery and hybrid search
//!
//! Each module owns a focused thiserror enum. [`TopicaError`] wraps them at
//! the application boundary and adds stable status codes plus recovery
//! suggestions for the CLI.

use crate::pipeline::ExtractionError;
use crate::search::SearchError;
use crate::storage::StorageError;
use crate::vector::{ClusteringError, VectorError};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for application-level operations
#[derive(Error, Debug)]
pub enum TopicaError {
    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    /// Failed to open persistent state
    #[error("Failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Vector(#[from] VectorError),

    #[error(transparent)]
    Clustering(#[from] ClusteringError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("No embedding provider is configured for this context")]
    EmbedderUnavailable,

    #[error("Background task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl TopicaError {
    /// Get a stable status code for this error type.
    pub fn status_code(&self) -> String {
        match self {
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Open { .. } => "OPEN_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Vector(VectorError::DimensionMismatch { .. }) => "DIMENSION_MISMATCH",
            Self::Vector(VectorError::EmbeddingFailed(_)) => "EMBEDDING_FAILED",
            Self::Vector(_) => "VECTOR_ERROR",
            Self::Clustering(_) => "CLUSTERING_ERROR",
            Self::Search(_) => "SEARCH_ERROR",
            Self::Extraction(_) => "EXTRACTION_ERROR",
            Self::EmbedderUnavailable => "EMBEDDER_UNAVAILABLE",
            Self::TaskJoin(_) => "TASK_JOIN_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Config { .. } => vec![
                "Check .topica/settings.toml for typos",
                "Run 'topica init --force' to regenerate the default settings",
            ],
            Self::Open { .. } => vec![
                "Check that the data directory exists and is writable",
                "Run 'topica init' in the workspace root",
            ],
            Self::Vector(VectorError::DimensionMismatch { .. }) => vec![
                "Stored vectors were produced by a different embedding model",
                "Clear the data directory and run 'topica embed' again",
            ],
            Self::Vector(VectorError::EmbeddingFailed(_)) => vec![
                "Vectors written by earlier batches were kept",
                "Run 'topica embed' again to continue where it stopped",
            ],
            Self::Storage(StorageError::UnsupportedVersion { .. }) => vec![
                "The store was written by a newer version of topica",
                "Upgrade topica or remove the data directory",
            ],
            Self::Storage(_) => vec![
                "Check disk space and permissions in the data directory",
                "Remove the lexical index directory to rebuild it on the next embed",
            ],
            Self::EmbedderUnavailable => vec!["Create the context with an embedding provider"],
            _ => vec![],
        }
    }
}

/// Result type alias for application-level operations
pub type TopicaResult<T> = Result<T, TopicaError>;

/// Helper trait for attaching the path being opened to an error
pub trait ErrorContext<T> {
    fn with_path(self, path: &std::path::Path) -> TopicaResult<T>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_path(self, path: &std::path::Path) -> TopicaResult<T> {
        self.map_err(|e| TopicaError::Open {
            path: path.to_path_buf(),
            source: Box::new(e),
        })
    }
}
