use crate::context::AppContext;
use crate::error::TopicaResult;
use crate::pipeline::progress::{ProgressSink, emit};
use crate::search::LexicalIndex;
use crate::storage::{Document, DocumentStore};
use crate::types::Phase;
use crate::vector::{EmbeddingGenerator, VectorError};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

const DEFAULT_BATCH_SIZE: usize = 32;
const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(1000);

/// Summary of one embedding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmbedStats {
    /// Documents that received a vector in this pass.
    pub embedded: usize,
    /// Documents that already had a vector.
    pub skipped: usize,
    pub batches: usize,
}

/// Embeds every document that has no vector yet and indexes its text.
pub struct EmbeddingPass {
    store: Arc<dyn DocumentStore>,
    lexical: Arc<dyn LexicalIndex>,
    embedder: Arc<dyn EmbeddingGenerator>,
    batch_size: usize,
    batch_delay: Duration,
}

impl EmbeddingPass {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        lexical: Arc<dyn LexicalIndex>,
        embedder: Arc<dyn EmbeddingGenerator>,
    ) -> Self {
        Self {
            store,
            lexical,
            embedder,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
        }
    }

    /// Builds a pass from the context using the `[embedding]` settings.
    pub fn from_context(context: &AppContext) -> TopicaResult<Self> {
        let config = &context.settings().embedding;
        Ok(Self::new(context.store(), context.lexical(), context.embedder()?)
            .with_batch_size(config.batch_size)
            .with_batch_delay(Duration::from_millis(config.batch_delay_ms)))
    }

    /// Documents per provider call; 0 is treated as 1.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Pause between consecutive provider calls.
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Runs the pass.
    ///
    /// A provider error stops the pass. Vectors from batches that already
    /// finished stay in the store and are persisted before the error is
    /// returned, so the next run only embeds what is left.
    pub async fn run(&self, progress: Option<&dyn ProgressSink>) -> TopicaResult<EmbedStats> {
        let store = Arc::clone(&self.store);
        let documents = spawn_blocking(move || store.documents()).await??;

        let (pending, done): (Vec<Document>, Vec<Document>) =
            documents.into_iter().partition(|doc| !doc.has_vector());

        let mut stats = EmbedStats {
            skipped: done.len(),
            ..EmbedStats::default()
        };
        let total = pending.len();

        let outcome = self.embed_batches(&pending, &mut stats, progress).await;
        if let Err(e) = &outcome {
            warn!(
                "Embedding stopped after {} of {total} documents: {e}",
                stats.embedded
            );
        }

        emit(progress, Phase::Indexing, stats.embedded, total);
        self.persist().await?;
        outcome?;

        emit(progress, Phase::Complete, total, total);
        info!(
            "Embedded {} documents in {} batches ({} already embedded)",
            stats.embedded, stats.batches, stats.skipped
        );
        Ok(stats)
    }

    async fn embed_batches(
        &self,
        pending: &[Document],
        stats: &mut EmbedStats,
        progress: Option<&dyn ProgressSink>,
    ) -> TopicaResult<()> {
        let total = pending.len();

        for (index, batch) in pending.chunks(self.batch_size).enumerate() {
            if index > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            let vectors = self.embed_batch(batch).await?;

            let store = Arc::clone(&self.store);
            let lexical = Arc::clone(&self.lexical);
            let batch_docs = batch.to_vec();
            spawn_blocking(move || -> TopicaResult<()> {
                for (doc, vector) in batch_docs.into_iter().zip(vectors) {
                    store.set_vector(doc.id, vector)?;
                    lexical.reindex(doc.id, &doc.text)?;
                }
                Ok(())
            })
            .await??;

            stats.embedded += batch.len();
            stats.batches += 1;
            debug!("Embedded batch {} ({}/{total})", index + 1, stats.embedded);
            emit(progress, Phase::Embedding, stats.embedded, total);
        }

        Ok(())
    }

    async fn embed_batch(&self, batch: &[Document]) -> TopicaResult<Vec<Vec<f32>>> {
        let embedder = Arc::clone(&self.embedder);
        let texts: Vec<String> = batch.iter().map(|doc| doc.text.clone()).collect();

        let vectors = spawn_blocking(move || {
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            let vectors = embedder.generate_embeddings(&refs)?;
            let dimension = embedder.dimension();
            for vector in &vectors {
                dimension.validate_vector(vector)?;
            }
            Ok::<_, VectorError>(vectors)
        })
        .await??;

        if vectors.len() != batch.len() {
            return Err(VectorError::EmbeddingCountMismatch {
                expected: batch.len(),
                actual: vectors.len(),
            }
            .into());
        }
        Ok(vectors)
    }

    async fn persist(&self) -> TopicaResult<()> {
        let store = Arc::clone(&self.store);
        let lexical = Arc::clone(&self.lexical);
        spawn_blocking(move || -> TopicaResult<()> {
            lexical.commit()?;
            store.flush()?;
            Ok(())
        })
        .await?
    }
}
