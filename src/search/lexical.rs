//! Keyword (BM25) index over document texts, backed by tantivy.

use crate::storage::{StorageError, StorageResult};
use crate::types::DocumentId;
use parking_lot::Mutex;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::directory::MmapDirectory;
use tantivy::query::QueryParser;
use tantivy::schema::{FAST, Field, INDEXED, STORED, Schema, TEXT, Value};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::debug;

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Keyword search collaborator used by hybrid search.
///
/// Scores are whatever the backend produces; callers only rely on them
/// being comparable within one result list.
pub trait LexicalIndex: Send + Sync {
    /// Top `limit` documents matching `query`, best first.
    fn search(&self, query: &str, limit: usize) -> StorageResult<Vec<(DocumentId, f32)>>;

    /// Replaces the indexed text of a document. Visible after [`commit`](Self::commit).
    fn reindex(&self, id: DocumentId, text: &str) -> StorageResult<()>;

    /// Makes pending changes searchable.
    fn commit(&self) -> StorageResult<()>;
}

/// BM25 index with a numeric id field and a tokenized text field.
pub struct TantivyLexicalIndex {
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter<TantivyDocument>>,
    id_field: Field,
    text_field: Field,
}

impl TantivyLexicalIndex {
    /// Index held entirely in memory.
    pub fn in_memory() -> StorageResult<Self> {
        let (schema, id_field, text_field) = Self::schema();
        let index = Index::create_in_ram(schema);
        Self::from_index(index, id_field, text_field)
    }

    /// Opens the index stored under `path`, creating it when missing.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;

        let (schema, id_field, text_field) = Self::schema();
        let directory = MmapDirectory::open(path)?;
        let index = Index::open_or_create(directory, schema)?;
        debug!("Opened lexical index at {}", path.display());
        Self::from_index(index, id_field, text_field)
    }

    fn schema() -> (Schema, Field, Field) {
        let mut builder = Schema::builder();
        let id_field = builder.add_u64_field("doc_id", INDEXED | STORED | FAST);
        let text_field = builder.add_text_field("text", TEXT);
        (builder.build(), id_field, text_field)
    }

    fn from_index(index: Index, id_field: Field, text_field: Field) -> StorageResult<Self> {
        let writer: IndexWriter<TantivyDocument> = index.writer(WRITER_HEAP_BYTES)?;
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        Ok(Self {
            index,
            reader,
            writer: Mutex::new(writer),
            id_field,
            text_field,
        })
    }

    /// Number of searchable documents.
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

impl LexicalIndex for TantivyLexicalIndex {
    fn search(&self, query: &str, limit: usize) -> StorageResult<Vec<(DocumentId, f32)>> {
        if limit == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let parser = QueryParser::for_index(&self.index, vec![self.text_field]);
        let (parsed, errors) = parser.parse_query_lenient(query);
        if !errors.is_empty() {
            debug!("Lenient parse of '{query}' dropped {} clause(s)", errors.len());
        }

        let searcher = self.reader.searcher();
        let top_docs = searcher.search(&parsed, &TopDocs::with_limit(limit))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            let id = doc
                .get_first(self.id_field)
                .and_then(|value| value.as_u64())
                .ok_or_else(|| StorageError::TantivyOperation {
                    operation: "search".to_string(),
                    cause: "indexed document has no doc_id".to_string(),
                })?;
            hits.push((DocumentId(id), score));
        }

        Ok(hits)
    }

    fn reindex(&self, id: DocumentId, text: &str) -> StorageResult<()> {
        let mut doc = TantivyDocument::default();
        doc.add_u64(self.id_field, id.value());
        doc.add_text(self.text_field, text);

        let writer = self.writer.lock();
        writer.delete_term(Term::from_field_u64(self.id_field, id.value()));
        writer.add_document(doc)?;
        Ok(())
    }

    fn commit(&self) -> StorageResult<()> {
        self.writer.lock().commit()?;
        self.reader.reload()?;
        Ok(())
    }
}
