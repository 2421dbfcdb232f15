//! Semantic, keyword, and hybrid retrieval over stored documents.
//!
//! Hybrid search embeds the query, ranks stored vectors by cosine
//! similarity, runs a BM25 keyword query at the same time, and merges the
//! two lists. Keyword failures never fail a query.

mod engine;
mod hybrid;
mod lexical;
mod ranker;

pub use engine::{HybridSearchEngine, HybridSearchOutput, SearchError};
pub use hybrid::{
    DEFAULT_LEXICAL_WEIGHT, DEFAULT_VECTOR_BOOST, LexicalOutcome, MergeWeights, merge,
    merge_with_weights,
};
pub use lexical::{LexicalIndex, TantivyLexicalIndex};
pub use ranker::rank_by_similarity;

use crate::types::DocumentId;
use serde::Serialize;

/// A scored document reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchResult {
    pub document_id: DocumentId,
    pub score: f32,
}

impl SearchResult {
    pub fn new(document_id: DocumentId, score: f32) -> Self {
        Self { document_id, score }
    }
}

/// Sorts by descending score, then ascending id.
fn sort_by_score(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.document_id.cmp(&b.document_id))
    });
}
