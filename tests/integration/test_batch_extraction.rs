use crate::common::{RecordingProgress, fast_settings, memory_context, seed_documents, HashEmbedder};
use std::sync::Arc;
use topica::pipeline::{
    BatchExtraction, Extraction, ExtractionError, ExtractionKind, Extractor, PatternExtractor,
};
use topica::{Document, DocumentId, Phase};

/// Returns an unusable response for every batch holding a flagged document.
struct FlakyExtractor;

impl Extractor for FlakyExtractor {
    fn extract(&self, documents: &[Document]) -> Result<Vec<Extraction>, ExtractionError> {
        if documents.iter().any(|doc| doc.text.contains("flaky")) {
            return Err(ExtractionError::InvalidResponse(
                "expected a JSON array".to_string(),
            ));
        }
        PatternExtractor.extract(documents)
    }
}

#[tokio::test]
async fn failed_batches_are_reported_and_skipped() {
    let context = memory_context(fast_settings(), Arc::new(HashEmbedder::new()));
    seed_documents(
        context.store().as_ref(),
        &[
            "todo: renew the domain",
            "idea: weekly digest email",
            "plain note",
            "flaky upstream response",
            "task: fix the build",
            "nothing here",
            "what if we cached the index",
        ],
    );

    let documents = context.store().documents().unwrap();
    let progress = RecordingProgress::default();
    let report = BatchExtraction::from_context(&context, Arc::new(FlakyExtractor))
        .run(documents, Some(&progress))
        .await
        .unwrap();

    // Batches of three: [1,2,3] ok, [4,5,6] fails, [7] ok
    assert_eq!(report.batches, 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].batch, 1);
    assert_eq!(
        report.failures[0].document_ids,
        vec![DocumentId(4), DocumentId(5), DocumentId(6)]
    );
    assert!(report.failures[0].reason.contains("JSON array"));

    let kinds: Vec<(u64, ExtractionKind)> = report
        .items
        .iter()
        .map(|e| (e.document_id.0, e.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (1, ExtractionKind::Task),
            (2, ExtractionKind::Idea),
            (7, ExtractionKind::Idea)
        ]
    );

    assert_eq!(context.store().extractions().unwrap(), report.items);
    assert_eq!(progress.phases().last(), Some(&Phase::Complete));
    assert_eq!(
        progress
            .phases()
            .iter()
            .filter(|p| **p == Phase::Analyzing)
            .count(),
        3
    );
}

#[tokio::test]
async fn empty_input_produces_empty_report() {
    let context = memory_context(fast_settings(), Arc::new(HashEmbedder::new()));
    let report = BatchExtraction::from_context(&context, Arc::new(PatternExtractor))
        .run(Vec::new(), None)
        .await
        .unwrap();

    assert_eq!(report.batches, 0);
    assert!(report.items.is_empty());
    assert!(report.is_complete());
}

#[tokio::test]
async fn rerunning_extraction_does_not_duplicate_items() {
    let context = memory_context(fast_settings(), Arc::new(HashEmbedder::new()));
    seed_documents(
        context.store().as_ref(),
        &["todo: write docs", "idea: nightly digest", "plain note", "task: rotate keys"],
    );
    let pass = BatchExtraction::from_context(&context, Arc::new(PatternExtractor));

    pass.run(context.store().documents().unwrap(), None)
        .await
        .unwrap();
    let stored = context.store().extractions().unwrap().len();
    assert_eq!(stored, 3);

    pass.run(context.store().documents().unwrap(), None)
        .await
        .unwrap();
    assert_eq!(context.store().extractions().unwrap().len(), stored);
}
