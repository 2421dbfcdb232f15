use crate::common::{ThemeEmbedder, corpus, fast_settings, seed_documents};
use std::sync::Arc;
use tempfile::TempDir;
use topica::pipeline::EmbeddingPass;
use topica::search::HybridSearchEngine;
use topica::topics::TopicBuilder;
use topica::{AppContext, Settings};

fn workspace_settings(dir: &TempDir) -> Settings {
    Settings {
        data_path: dir.path().join("data"),
        ..fast_settings()
    }
}

#[tokio::test]
async fn embeddings_topics_and_index_survive_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let context = AppContext::open(workspace_settings(&dir))
            .unwrap()
            .with_embedder(Arc::new(ThemeEmbedder));
        seed_documents(context.store().as_ref(), corpus::NOTES);
        EmbeddingPass::from_context(&context)
            .unwrap()
            .run(None)
            .await
            .unwrap();
        TopicBuilder::from_context(&context)
            .with_k(Some(2))
            .rebuild(None)
            .unwrap();
    }

    assert!(dir.path().join("data").join("store.json").is_file());

    let reopened = AppContext::open(workspace_settings(&dir))
        .unwrap()
        .with_embedder(Arc::new(ThemeEmbedder));
    let store = reopened.store();
    assert_eq!(store.documents_with_vectors().unwrap().len(), corpus::NOTES.len());
    assert_eq!(store.topics().unwrap().len(), 2);

    let output = HybridSearchEngine::from_context(&reopened)
        .unwrap()
        .search("sourdough", 3)
        .await
        .unwrap();
    assert!(!output.lexical.is_failed());
    assert!(!output.lexical.matches().is_empty());
    assert!(output.text(output.results[0].document_id).unwrap().contains("sourdough"));
}
