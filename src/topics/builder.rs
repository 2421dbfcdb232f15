use crate::config::ClusteringConfig;
use crate::context::{AppContext, seeded_rng};
use crate::error::TopicaResult;
use crate::pipeline::{ProgressSink, emit_progress};
use crate::storage::DocumentStore;
use crate::topics::{KMEANS_CONFIDENCE, Topic, TopicMembership, label_clusters};
use crate::types::{DocumentId, Phase, TopicId};
use crate::vector::{cluster_with_rng, inertia, suggest_k_with_rng};
use chrono::Utc;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Summary of a clustering run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusteringReport {
    /// Cluster count the run was asked for.
    pub k: usize,
    /// Whether `k` came from the elbow heuristic rather than configuration.
    pub k_suggested: bool,
    pub iterations: usize,
    /// Sum of squared distances from each document to its centroid.
    pub inertia: f32,
    /// Documents that took part in the run.
    pub documents: usize,
    pub topics: Vec<Topic>,
}

impl ClusteringReport {
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

/// Rebuilds the stored topics from the current document vectors.
pub struct TopicBuilder {
    store: Arc<dyn DocumentStore>,
    config: ClusteringConfig,
}

impl TopicBuilder {
    pub fn new(store: Arc<dyn DocumentStore>, config: ClusteringConfig) -> Self {
        Self { store, config }
    }

    pub fn from_context(context: &AppContext) -> Self {
        Self::new(context.store(), context.settings().clustering.clone())
    }

    /// Overrides the configured cluster count; `None` uses the elbow heuristic.
    pub fn with_k(mut self, k: Option<usize>) -> Self {
        self.config.k = k;
        self
    }

    /// Rebuilds topics with the configured seed policy.
    pub fn rebuild(&self, progress: Option<&dyn ProgressSink>) -> TopicaResult<ClusteringReport> {
        let mut rng = seeded_rng(self.config.seed);
        self.rebuild_with_rng(&mut rng, progress)
    }

    /// Clusters every embedded document and replaces all stored topics.
    ///
    /// Reads one snapshot of the vectors up front. With no embedded
    /// documents the stored topics are cleared and an empty report is
    /// returned.
    pub fn rebuild_with_rng<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        progress: Option<&dyn ProgressSink>,
    ) -> TopicaResult<ClusteringReport> {
        let documents = self.store.documents_with_vectors()?;
        let total = documents.len();
        emit_progress(progress, Phase::Clustering, 0, total);

        let mut ids = Vec::with_capacity(total);
        let mut texts = Vec::with_capacity(total);
        let mut points = Vec::with_capacity(total);
        for doc in documents {
            if let Some(vector) = doc.vector {
                ids.push(doc.id);
                texts.push(doc.text);
                points.push(vector);
            }
        }

        if points.is_empty() {
            emit_progress(progress, Phase::Saving, 0, 0);
            self.save(Vec::new(), &[], &[])?;
            emit_progress(progress, Phase::Complete, 0, 0);
            info!("No embedded documents, cleared topics");
            return Ok(ClusteringReport::default());
        }

        let (k, k_suggested) = match self.config.k {
            Some(k) => (k, false),
            None => (suggest_k_with_rng(&points, self.config.max_k, rng)?, true),
        };

        let result = cluster_with_rng(&points, k, self.config.max_iterations, rng)?;
        let run_inertia = inertia(&points, &result);
        emit_progress(progress, Phase::Clustering, total, total);
        debug!(
            "k-means with k={k} finished after {} iterations, inertia {run_inertia}",
            result.iterations
        );

        let labels = label_clusters(
            &points,
            &texts,
            &result.assignments,
            result.cluster_count(),
            Some(result.centroids.as_slice()),
        );

        let created_at = Utc::now().timestamp() as u64;
        let topics: Vec<Topic> = labels
            .into_iter()
            .enumerate()
            .map(|(cluster, name)| {
                let documents: Vec<TopicMembership> = result
                    .members(cluster)
                    .map(|index| TopicMembership {
                        document_id: ids[index],
                        confidence: KMEANS_CONFIDENCE,
                    })
                    .collect();
                Topic {
                    id: TopicId::from_cluster(cluster),
                    name,
                    description: format!("{} documents", documents.len()),
                    documents,
                    created_at,
                }
            })
            .collect();

        emit_progress(progress, Phase::Saving, 0, topics.len());
        self.save(topics.clone(), &ids, &result.assignments)?;
        emit_progress(progress, Phase::Complete, topics.len(), topics.len());

        info!(
            "Built {} topics from {total} documents in {} iterations",
            topics.len(),
            result.iterations
        );

        Ok(ClusteringReport {
            k,
            k_suggested,
            iterations: result.iterations,
            inertia: run_inertia,
            documents: total,
            topics,
        })
    }

    /// Replaces topics and rewrites cluster ids. Documents that were not part
    /// of the run lose any stale cluster id.
    fn save(
        &self,
        topics: Vec<Topic>,
        ids: &[DocumentId],
        assignments: &[usize],
    ) -> TopicaResult<()> {
        self.store.replace_topics(topics)?;

        for (id, cluster) in ids.iter().zip(assignments) {
            self.store.set_cluster(*id, Some(*cluster))?;
        }

        let clustered: HashSet<DocumentId> = ids.iter().copied().collect();
        for doc in self.store.documents()? {
            if doc.cluster.is_some() && !clustered.contains(&doc.id) {
                self.store.set_cluster(doc.id, None)?;
            }
        }

        self.store.flush()?;
        Ok(())
    }
}
