use crate::types::DocumentId;
use tantivy::directory::error::OpenDirectoryError;
use tantivy::TantivyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] TantivyError),

    #[error("Tantivy operation error during {operation}: {cause}")]
    TantivyOperation { operation: String, cause: String },

    #[error("Document not found: {0}")]
    DocumentNotFound(DocumentId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Snapshot version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Directory error: {0}")]
    Directory(#[from] OpenDirectoryError),
}

pub type StorageResult<T> = Result<T, StorageError>;
