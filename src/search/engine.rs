use crate::context::AppContext;
use crate::error::TopicaResult;
use crate::search::{
    LexicalIndex, LexicalOutcome, MergeWeights, SearchResult, merge_with_weights,
    rank_by_similarity,
};
use crate::storage::{DocumentStore, StorageError};
use crate::types::DocumentId;
use crate::vector::{EmbeddingGenerator, VectorError};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::{JoinError, spawn_blocking};
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Failed to embed query: {0}")]
    Embedding(#[source] VectorError),

    #[error("{0}\nSuggestion: Re-run 'topica embed' after changing the embedding model")]
    Ranking(#[source] VectorError),

    #[error("Failed to read documents: {0}")]
    Storage(#[from] StorageError),

    #[error("Search task failed: {0}")]
    Task(#[from] JoinError),
}

/// Merged results of a hybrid query.
#[derive(Debug, Clone)]
pub struct HybridSearchOutput {
    pub results: Vec<SearchResult>,

    /// Lexical half of the query, including a failure if one happened.
    pub lexical: LexicalOutcome,

    /// Text of each result document that is still stored.
    pub texts: HashMap<DocumentId, String>,
}

impl HybridSearchOutput {
    pub fn text(&self, id: DocumentId) -> Option<&str> {
        self.texts.get(&id).map(String::as_str)
    }
}

/// Combines semantic ranking with keyword search.
pub struct HybridSearchEngine {
    store: Arc<dyn DocumentStore>,
    lexical: Arc<dyn LexicalIndex>,
    embedder: Arc<dyn EmbeddingGenerator>,
    weights: MergeWeights,
}

impl HybridSearchEngine {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        lexical: Arc<dyn LexicalIndex>,
        embedder: Arc<dyn EmbeddingGenerator>,
        weights: MergeWeights,
    ) -> Self {
        Self {
            store,
            lexical,
            embedder,
            weights,
        }
    }

    /// Builds an engine from the context's handles and `[search]` weights.
    pub fn from_context(context: &AppContext) -> TopicaResult<Self> {
        Ok(Self::new(
            context.store(),
            context.lexical(),
            context.embedder()?,
            MergeWeights::from(&context.settings().search),
        ))
    }

    /// Runs a hybrid query.
    ///
    /// Vector ranking and keyword search run concurrently. A keyword failure
    /// is logged and reported in [`HybridSearchOutput::lexical`]; embedding
    /// and dimension errors fail the query.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<HybridSearchOutput, SearchError> {
        let embedder = Arc::clone(&self.embedder);
        let query_text = query.to_string();
        let query_vector = spawn_blocking(move || embedder.embed(&query_text))
            .await?
            .map_err(SearchError::Embedding)?;

        let store = Arc::clone(&self.store);
        let vector_task = spawn_blocking(move || -> Result<_, SearchError> {
            let candidates: Vec<(DocumentId, Vec<f32>)> = store
                .documents_with_vectors()?
                .into_iter()
                .filter_map(|doc| doc.vector.map(|vector| (doc.id, vector)))
                .collect();
            rank_by_similarity(&query_vector, &candidates, limit).map_err(SearchError::Ranking)
        });

        let lexical = Arc::clone(&self.lexical);
        let query_text = query.to_string();
        let lexical_task = spawn_blocking(move || lexical.search(&query_text, limit));

        let (vector_joined, lexical_joined) = tokio::join!(vector_task, lexical_task);
        let vector_results = vector_joined??;

        let lexical = match lexical_joined {
            Ok(result) => LexicalOutcome::from_result(result),
            Err(e) => LexicalOutcome::Failed {
                reason: e.to_string(),
            },
        };
        if let LexicalOutcome::Failed { reason } = &lexical {
            warn!("Keyword search failed, using semantic results only: {reason}");
        }

        let results = merge_with_weights(&vector_results, &lexical, limit, self.weights);
        debug!(
            "Hybrid query '{query}': {} vector, {} keyword, {} merged",
            vector_results.len(),
            lexical.matches().len(),
            results.len()
        );

        let texts = self.resolve_texts(&results).await?;
        Ok(HybridSearchOutput {
            results,
            lexical,
            texts,
        })
    }

    async fn resolve_texts(
        &self,
        results: &[SearchResult],
    ) -> Result<HashMap<DocumentId, String>, SearchError> {
        let store = Arc::clone(&self.store);
        let ids: Vec<DocumentId> = results.iter().map(|r| r.document_id).collect();

        spawn_blocking(move || -> Result<_, SearchError> {
            let mut texts = HashMap::with_capacity(ids.len());
            for id in ids {
                if let Some(doc) = store.document(id)? {
                    texts.insert(id, doc.text);
                }
            }
            Ok(texts)
        })
        .await?
    }
}
