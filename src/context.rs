//! Long-lived handles shared by the embedding, clustering, and search passes.

use crate::config::Settings;
use crate::error::{ErrorContext, TopicaError, TopicaResult};
use crate::search::{LexicalIndex, TantivyLexicalIndex};
use crate::storage::{DocumentStore, MemoryStore};
use crate::vector::{EmbeddingGenerator, FastEmbedGenerator};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tracing::{debug, info};

/// Owns the collaborators of one workspace.
///
/// Independent contexts never share state, so tests can run side by side
/// with their own stores and indexes.
#[derive(Clone)]
pub struct AppContext {
    settings: Arc<Settings>,
    store: Arc<dyn DocumentStore>,
    lexical: Arc<dyn LexicalIndex>,
    embedder: Option<Arc<dyn EmbeddingGenerator>>,
}

impl AppContext {
    pub fn new(
        settings: Settings,
        store: Arc<dyn DocumentStore>,
        lexical: Arc<dyn LexicalIndex>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            store,
            lexical,
            embedder: None,
        }
    }

    /// Opens the store snapshot and lexical index under the data directory.
    pub fn open(settings: Settings) -> TopicaResult<Self> {
        let store_path = settings.store_path();
        let store = MemoryStore::open(&store_path).with_path(&store_path)?;

        let index_path = settings.lexical_index_path();
        let lexical = TantivyLexicalIndex::open(&index_path).with_path(&index_path)?;

        debug!(
            "Opened workspace data at {}",
            settings.resolved_data_path().display()
        );
        Ok(Self::new(settings, Arc::new(store), Arc::new(lexical)))
    }

    /// Attaches an embedding provider.
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingGenerator>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Loads the configured fastembed model and attaches it.
    pub fn with_fastembed(self, show_download_progress: bool) -> TopicaResult<Self> {
        let model = self.settings.embedding.model.clone();
        info!("Loading embedding model {model}");
        let generator =
            FastEmbedGenerator::new(&model, self.settings.models_dir(), show_download_progress)?;
        Ok(self.with_embedder(Arc::new(generator)))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.store)
    }

    pub fn lexical(&self) -> Arc<dyn LexicalIndex> {
        Arc::clone(&self.lexical)
    }

    pub fn embedder(&self) -> TopicaResult<Arc<dyn EmbeddingGenerator>> {
        self.embedder
            .as_ref()
            .map(Arc::clone)
            .ok_or(TopicaError::EmbedderUnavailable)
    }
}

/// Deterministic generator for `Some(seed)`, OS-seeded otherwise.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("data_path", &self.settings.resolved_data_path())
            .field("has_embedder", &self.embedder.is_some())
            .finish()
    }
}
