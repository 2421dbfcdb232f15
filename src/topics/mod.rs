//! Topic discovery: clustering embedded documents and naming the clusters.
//!
//! A clustering run replaces every previously stored topic. Topics are never
//! updated incrementally; their ids are renumbered from 1 on each run.

mod builder;
mod labeler;

pub use builder::{ClusteringReport, TopicBuilder};
pub use labeler::{
    EMPTY_CLUSTER_LABEL, MAX_LABEL_CHARS, clean_label, fallback_label, label_clusters,
};

use crate::types::{DocumentId, TopicId};
use serde::{Deserialize, Serialize};

/// Confidence recorded for hard k-means assignments.
pub const KMEANS_CONFIDENCE: f32 = 1.0;

/// A persisted cluster of documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,

    /// Label derived from the representative document.
    pub name: String,

    pub description: String,

    /// Member documents, in input order of the clustering run.
    pub documents: Vec<TopicMembership>,

    /// Unix timestamp (UTC) of the clustering run that produced the topic.
    pub created_at: u64,
}

/// Link between a topic and one of its documents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopicMembership {
    pub document_id: DocumentId,
    pub confidence: f32,
}

impl Topic {
    /// Number of member documents.
    pub fn size(&self) -> usize {
        self.documents.len()
    }

    /// Zero-based cluster index this topic was built from.
    pub fn cluster_index(&self) -> usize {
        self.id.value().saturating_sub(1) as usize
    }
}
