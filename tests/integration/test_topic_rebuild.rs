use crate::common::{RecordingProgress, ThemeEmbedder, corpus, fast_settings, memory_context, seed_documents};
use std::collections::HashSet;
use std::sync::Arc;
use topica::pipeline::EmbeddingPass;
use topica::topics::TopicBuilder;
use topica::{AppContext, DocumentId, Phase};

async fn embedded_context(settings: topica::Settings) -> AppContext {
    let context = memory_context(settings, Arc::new(ThemeEmbedder));
    seed_documents(context.store().as_ref(), corpus::NOTES);
    EmbeddingPass::from_context(&context)
        .unwrap()
        .run(None)
        .await
        .unwrap();
    context
}

fn member_sets(context: &AppContext) -> Vec<HashSet<DocumentId>> {
    let mut sets: Vec<HashSet<DocumentId>> = context
        .store()
        .topics()
        .unwrap()
        .iter()
        .map(|topic| topic.documents.iter().map(|m| m.document_id).collect())
        .collect();
    sets.sort_by_key(|set| set.iter().min().copied());
    sets
}

#[tokio::test]
async fn elbow_heuristic_finds_the_two_themes() {
    let context = embedded_context(fast_settings()).await;
    let progress = RecordingProgress::default();

    let report = TopicBuilder::from_context(&context)
        .rebuild(Some(&progress))
        .unwrap();

    assert!(report.k_suggested);
    assert_eq!(report.k, 2);
    assert_eq!(report.documents, corpus::NOTES.len());

    let expected: Vec<HashSet<DocumentId>> = vec![
        (1..=4).map(DocumentId).collect(),
        (5..=8).map(DocumentId).collect(),
    ];
    assert_eq!(member_sets(&context), expected);

    let phases = progress.phases();
    assert_eq!(phases.first(), Some(&Phase::Clustering));
    assert!(phases.contains(&Phase::Saving));
    assert_eq!(phases.last(), Some(&Phase::Complete));
}

#[tokio::test]
async fn configured_k_overrides_the_heuristic() {
    let mut settings = fast_settings();
    settings.clustering.k = Some(3);
    let context = embedded_context(settings).await;

    let report = TopicBuilder::from_context(&context).rebuild(None).unwrap();
    assert!(!report.k_suggested);
    assert_eq!(report.topics.len(), 3);

    let total: usize = report.topics.iter().map(|t| t.size()).sum();
    assert_eq!(total, corpus::NOTES.len());
}

#[tokio::test]
async fn every_document_records_its_topic() {
    let context = embedded_context(fast_settings()).await;
    let report = TopicBuilder::from_context(&context)
        .with_k(Some(2))
        .rebuild(None)
        .unwrap();

    let store = context.store();
    for topic in &report.topics {
        assert!(!topic.name.is_empty());
        assert_eq!(topic.description, format!("{} documents", topic.size()));
        for member in &topic.documents {
            let doc = store.document(member.document_id).unwrap().unwrap();
            assert_eq!(doc.cluster, Some(topic.cluster_index()));
            assert_eq!(member.confidence, 1.0);
        }
    }
}

#[tokio::test]
async fn same_seed_gives_same_topics() {
    let first = embedded_context(fast_settings()).await;
    let second = embedded_context(fast_settings()).await;

    TopicBuilder::from_context(&first).rebuild(None).unwrap();
    TopicBuilder::from_context(&second).rebuild(None).unwrap();

    assert_eq!(member_sets(&first), member_sets(&second));
}

#[tokio::test]
async fn few_documents_get_one_topic_each() {
    let context = memory_context(fast_settings(), Arc::new(ThemeEmbedder));
    seed_documents(context.store().as_ref(), &corpus::NOTES[..3]);
    EmbeddingPass::from_context(&context)
        .unwrap()
        .run(None)
        .await
        .unwrap();

    let report = TopicBuilder::from_context(&context).rebuild(None).unwrap();
    assert_eq!(report.k, 3);
    assert_eq!(report.iterations, 1);
    assert!(report.topics.iter().all(|t| t.size() == 1));
}
