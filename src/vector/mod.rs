//! Vector math for topic discovery and semantic ranking.
//!
//! This module holds everything that operates purely on embeddings:
//! K-means clustering with K-means++ seeding, elbow-based selection of the
//! cluster count, cosine similarity, and the embedding generator trait that
//! produces the vectors in the first place.
//!
//! # Architecture
//! All computation here is single-threaded and CPU-bound. Randomized steps
//! take an injectable [`rand::Rng`] so runs can be reproduced with a seed.

mod clustering;
mod embedding;
mod selection;
mod similarity;
mod types;

pub use clustering::{
    ClusterResult, ClusteringError, DEFAULT_MAX_ITERATIONS, assign_to_nearest_centroid, cluster,
    cluster_with_rng, euclidean_distance, inertia, squared_euclidean_distance,
};
pub use embedding::{
    EmbeddingGenerator, FastEmbedGenerator, model_to_string, parse_embedding_model,
};
pub use selection::{
    DEFAULT_MAX_K, ElbowScan, SCAN_MAX_ITERATIONS, elbow_scan, suggest_k, suggest_k_with_rng,
};
pub use similarity::{cosine_similarity, magnitude};
pub use types::{VectorDimension, VectorError, ensure_same_dimension};
