use crate::common::{
    FailingLexicalIndex, HashEmbedder, corpus, fast_settings, memory_context, seed_documents,
};
use std::sync::Arc;
use topica::pipeline::EmbeddingPass;
use topica::search::{HybridSearchEngine, MergeWeights, SearchError};
use topica::storage::{Document, DocumentStore, MemoryStore};
use topica::{AppContext, DocumentId, VectorError};

async fn embedded_context() -> AppContext {
    let context = memory_context(fast_settings(), Arc::new(HashEmbedder::new()));
    seed_documents(context.store().as_ref(), corpus::NOTES);
    EmbeddingPass::from_context(&context)
        .unwrap()
        .run(None)
        .await
        .unwrap();
    context
}

#[tokio::test]
async fn keyword_and_semantic_matches_rank_first() {
    let context = embedded_context().await;
    let engine = HybridSearchEngine::from_context(&context).unwrap();

    let output = engine.search("sourdough bread", 5).await.unwrap();
    assert!(!output.lexical.is_failed());
    assert_eq!(output.results.len(), 5);
    assert!(output.results.windows(2).all(|w| w[0].score >= w[1].score));

    let top = output.results[0].document_id;
    assert!(output.text(top).unwrap().contains("sourdough"));
    for result in &output.results {
        assert!(result.score >= 0.0);
        assert!(output.text(result.document_id).is_some());
    }
}

#[tokio::test]
async fn lexical_failure_falls_back_to_semantic_results() {
    let working = embedded_context().await;
    let store = working.store();

    let engine = HybridSearchEngine::new(
        store,
        Arc::new(FailingLexicalIndex),
        Arc::new(HashEmbedder::new()),
        MergeWeights::default(),
    );

    let output = engine.search("rust borrow checker", 3).await.unwrap();
    assert!(output.lexical.is_failed());
    assert!(output.lexical.matches().is_empty());
    assert_eq!(output.results.len(), 3);
    assert!(output.text(output.results[0].document_id).unwrap().contains("rust"));
}

#[tokio::test]
async fn mismatched_stored_vector_fails_the_query() {
    let store = Arc::new(MemoryStore::new());
    store
        .upsert_document(Document::new(DocumentId(1), "legacy").with_vector(vec![1.0, 0.0]))
        .unwrap();

    let engine = HybridSearchEngine::new(
        store,
        Arc::new(FailingLexicalIndex),
        Arc::new(HashEmbedder::new()),
        MergeWeights::default(),
    );

    let err = engine.search("legacy", 5).await.unwrap_err();
    assert!(matches!(
        err,
        SearchError::Ranking(VectorError::DimensionMismatch { .. })
    ));
}

#[tokio::test]
async fn embedding_failure_fails_the_query() {
    let context = embedded_context().await;
    let engine = HybridSearchEngine::new(
        context.store(),
        context.lexical(),
        Arc::new(HashEmbedder::failing_from(1)),
        MergeWeights::default(),
    );

    let err = engine.search("bread", 5).await.unwrap_err();
    assert!(matches!(err, SearchError::Embedding(_)));
}

#[tokio::test]
async fn search_without_embedder_is_rejected() {
    let context = AppContext::new(
        fast_settings(),
        Arc::new(MemoryStore::new()),
        Arc::new(FailingLexicalIndex),
    );
    assert!(HybridSearchEngine::from_context(&context).is_err());
    assert!(context.store().documents().unwrap().is_empty());
}
