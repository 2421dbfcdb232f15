use crate::common::{HashEmbedder, RecordingProgress, corpus, fast_settings, memory_context, seed_documents};
use std::sync::Arc;
use topica::pipeline::EmbeddingPass;
use topica::{DocumentId, Phase};

#[tokio::test]
async fn embeds_all_documents_in_configured_batches() {
    let embedder = Arc::new(HashEmbedder::new());
    let context = memory_context(fast_settings(), embedder.clone());
    seed_documents(context.store().as_ref(), corpus::NOTES);

    let progress = RecordingProgress::default();
    let stats = EmbeddingPass::from_context(&context)
        .unwrap()
        .run(Some(&progress))
        .await
        .unwrap();

    assert_eq!(stats.embedded, corpus::NOTES.len());
    assert_eq!(stats.batches, 2);
    assert_eq!(embedder.calls(), 2);

    let store = context.store();
    assert!(store.documents_without_vectors().unwrap().is_empty());
    let first = store.document(DocumentId(1)).unwrap().unwrap();
    assert_eq!(first.vector, Some(HashEmbedder::vector_for(corpus::NOTES[0])));

    // Text is searchable by keyword after the pass
    let hits = context.lexical().search("sourdough", 10).unwrap();
    assert_eq!(hits.len(), 4);

    assert_eq!(progress.phases().last(), Some(&Phase::Complete));
    assert!(progress.phases().contains(&Phase::Indexing));
}

#[tokio::test]
async fn rerun_only_embeds_new_documents() {
    let embedder = Arc::new(HashEmbedder::new());
    let context = memory_context(fast_settings(), embedder.clone());
    seed_documents(context.store().as_ref(), &corpus::NOTES[..3]);

    let pass = EmbeddingPass::from_context(&context).unwrap();
    pass.run(None).await.unwrap();

    context
        .store()
        .upsert_document(topica::Document::new(DocumentId(10), "a brand new note"))
        .unwrap();

    let stats = pass.run(None).await.unwrap();
    assert_eq!(stats.embedded, 1);
    assert_eq!(stats.skipped, 3);
    assert_eq!(embedder.calls(), 2);
}

#[tokio::test]
async fn provider_failure_aborts_but_keeps_finished_batches() {
    let context = memory_context(fast_settings(), Arc::new(HashEmbedder::failing_from(2)));
    seed_documents(context.store().as_ref(), corpus::NOTES);

    let err = EmbeddingPass::from_context(&context)
        .unwrap()
        .run(None)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), "EMBEDDING_FAILED");

    let store = context.store();
    assert_eq!(store.documents_with_vectors().unwrap().len(), 4);
    assert_eq!(store.documents_without_vectors().unwrap().len(), 4);
}
