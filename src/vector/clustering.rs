//! K-means clustering over document embeddings.
//!
//! Pure Rust implementation of Lloyd's algorithm seeded with K-means++.
//! Documents are grouped into topics without supervision; the result is
//! later labeled and persisted by the topic builder.
//!
//! # Algorithm Details
//! - Distance metric: Euclidean (squared distance for comparisons)
//! - Initialization: K-means++ (roulette selection over squared distances)
//! - Empty clusters: reseeded from a uniformly random input point
//! - Convergence: assignment vector unchanged between two iterations
//!
//! # Randomness
//! Initialization and empty-cluster reseeding draw from a caller supplied
//! [`rand::Rng`]. Use [`cluster_with_rng`] with a seeded generator for
//! reproducible runs; [`cluster`] uses the thread-local generator.
//!
//! # Performance Characteristics
//! - O(n * k * d * iterations) time complexity
//! - O(k * d) space for centroids

use rand::Rng;
use thiserror::Error;
use tracing::debug;

/// Default iteration cap for a clustering run.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Result of a K-means clustering run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClusterResult {
    /// Cluster id (`0..k`) for each input point, by input index.
    pub assignments: Vec<usize>,

    /// One centroid per cluster id, each with the input dimension.
    pub centroids: Vec<Vec<f32>>,

    /// Number of iterations performed (1-indexed).
    pub iterations: usize,
}

impl ClusterResult {
    /// Number of clusters in this result.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.centroids.len()
    }

    /// Returns true when the run had no input points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Input indices assigned to `cluster`, in input order.
    pub fn members(&self, cluster: usize) -> impl Iterator<Item = usize> + '_ {
        self.assignments
            .iter()
            .enumerate()
            .filter(move |(_, c)| **c == cluster)
            .map(|(i, _)| i)
    }

    /// Number of points assigned to each cluster id.
    #[must_use]
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.centroids.len()];
        for &cluster in &self.assignments {
            sizes[cluster] += 1;
        }
        sizes
    }
}

/// Errors that can occur during clustering operations.
#[derive(Error, Debug)]
pub enum ClusteringError {
    #[error(
        "Invalid cluster count: {0}\nSuggestion: Use k >= 1 when clustering a non-empty set of vectors"
    )]
    InvalidClusterCount(usize),

    #[error(
        "Dimension mismatch at point {index}: expected {expected}, got {actual}\nSuggestion: Ensure all vectors come from the same embedding model"
    )]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

/// Clusters `points` into `k` groups using the thread-local random generator.
///
/// See [`cluster_with_rng`] for the full contract.
#[must_use = "clustering results should be used or the computation is wasted"]
pub fn cluster(
    points: &[Vec<f32>],
    k: usize,
    max_iterations: usize,
) -> Result<ClusterResult, ClusteringError> {
    cluster_with_rng(points, k, max_iterations, &mut rand::rng())
}

/// Performs K-means clustering on a set of vectors.
///
/// # Arguments
/// * `points` - Input vectors, all of the same dimension (may be empty)
/// * `k` - Number of clusters
/// * `max_iterations` - Iteration cap (values below 1 are treated as 1)
/// * `rng` - Random source for initialization and empty-cluster reseeding
///
/// # Returns
/// * Empty result with 0 iterations for empty input
/// * Identity assignment with copied centroids and 1 iteration when
///   `k >= points.len()`
/// * Otherwise the assignment reached at convergence or after
///   `max_iterations`
#[must_use = "clustering results should be used or the computation is wasted"]
pub fn cluster_with_rng<R: Rng + ?Sized>(
    points: &[Vec<f32>],
    k: usize,
    max_iterations: usize,
    rng: &mut R,
) -> Result<ClusterResult, ClusteringError> {
    if points.is_empty() {
        return Ok(ClusterResult::default());
    }

    validate_dimensions(points)?;

    if k >= points.len() {
        return Ok(ClusterResult {
            assignments: (0..points.len()).collect(),
            centroids: points.to_vec(),
            iterations: 1,
        });
    }

    if k == 0 {
        return Err(ClusteringError::InvalidClusterCount(k));
    }

    let max_iterations = max_iterations.max(1);
    let mut centroids = initialize_centroids_kmeans_plus_plus(points, k, rng);
    let mut assignments: Vec<usize> = Vec::new();
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iterations {
        iterations += 1;

        let next: Vec<usize> = points
            .iter()
            .map(|point| assign_to_nearest_centroid(point, &centroids))
            .collect();

        if next == assignments {
            converged = true;
            break;
        }

        assignments = next;
        centroids = update_centroids(points, &assignments, k, rng);
    }

    if converged {
        debug!("k-means (k={k}) converged after {iterations} iterations");
    } else {
        debug!("k-means (k={k}) stopped at the {max_iterations} iteration cap");
    }

    Ok(ClusterResult {
        assignments,
        centroids,
        iterations,
    })
}

/// Assigns a vector to the nearest centroid by Euclidean distance.
///
/// Clusters are scanned in id order and only a strictly smaller distance
/// replaces the current best, so ties resolve to the lowest cluster id.
/// Callers must ensure matching dimensions.
pub fn assign_to_nearest_centroid(vector: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best_distance = f32::INFINITY;
    let mut best_cluster = 0;

    for (i, centroid) in centroids.iter().enumerate() {
        let distance = squared_euclidean_distance(vector, centroid);
        if distance < best_distance {
            best_distance = distance;
            best_cluster = i;
        }
    }

    best_cluster
}

/// Squared Euclidean distance between two vectors of equal dimension.
pub fn squared_euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");

    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

/// Euclidean distance between two vectors of equal dimension.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    squared_euclidean_distance(a, b).sqrt()
}

/// Sum of squared distances from each point to its assigned centroid.
///
/// Returns 0.0 for an empty result.
pub fn inertia(points: &[Vec<f32>], result: &ClusterResult) -> f32 {
    points
        .iter()
        .zip(result.assignments.iter())
        .map(|(point, &cluster)| squared_euclidean_distance(point, &result.centroids[cluster]))
        .sum()
}

fn validate_dimensions(points: &[Vec<f32>]) -> Result<(), ClusteringError> {
    let expected = points[0].len();
    match points.iter().position(|p| p.len() != expected) {
        Some(index) => Err(ClusteringError::DimensionMismatch {
            index,
            expected,
            actual: points[index].len(),
        }),
        None => Ok(()),
    }
}

/// Recomputes centroids as the mean of their assigned vectors.
///
/// A cluster that received no points is reseeded with a uniformly random
/// point from the whole dataset.
fn update_centroids<R: Rng + ?Sized>(
    points: &[Vec<f32>],
    assignments: &[usize],
    k: usize,
    rng: &mut R,
) -> Vec<Vec<f32>> {
    let dimension = points[0].len();
    let mut sums = vec![vec![0.0f32; dimension]; k];
    let mut sizes = vec![0usize; k];

    for (point, &cluster) in points.iter().zip(assignments.iter()) {
        for (sum, &value) in sums[cluster].iter_mut().zip(point.iter()) {
            *sum += value;
        }
        sizes[cluster] += 1;
    }

    for (cluster, (centroid, &size)) in sums.iter_mut().zip(sizes.iter()).enumerate() {
        if size == 0 {
            let random_idx = rng.random_range(0..points.len());
            debug!("cluster {cluster} is empty, reseeding from point {random_idx}");
            centroid.copy_from_slice(&points[random_idx]);
        } else {
            for value in centroid.iter_mut() {
                *value /= size as f32;
            }
        }
    }

    sums
}

/// Initializes centroids using the K-means++ algorithm.
///
/// The first centroid is a uniformly random point. Each further centroid is
/// drawn with probability proportional to the squared distance between a
/// point and its nearest already chosen centroid.
fn initialize_centroids_kmeans_plus_plus<R: Rng + ?Sized>(
    points: &[Vec<f32>],
    k: usize,
    rng: &mut R,
) -> Vec<Vec<f32>> {
    let mut centroids = Vec::with_capacity(k);

    let first_idx = rng.random_range(0..points.len());
    centroids.push(points[first_idx].clone());

    // Squared distance from every point to its nearest chosen centroid
    let mut nearest: Vec<f64> = points
        .iter()
        .map(|p| f64::from(squared_euclidean_distance(p, &centroids[0])))
        .collect();

    for _ in 1..k {
        let total: f64 = nearest.iter().sum();
        let target = rng.random::<f64>() * total;

        let mut cumulative = 0.0;
        let mut selected = None;
        for (i, &distance) in nearest.iter().enumerate() {
            cumulative += distance;
            // Points already at a chosen centroid carry no weight
            if distance > 0.0 && cumulative >= target {
                selected = Some(i);
                break;
            }
        }

        // Rounding can leave the target above the final cumulative sum
        let chosen = selected.unwrap_or_else(|| rng.random_range(0..points.len()));
        let centroid = points[chosen].clone();

        for (slot, point) in nearest.iter_mut().zip(points.iter()) {
            let distance = f64::from(squared_euclidean_distance(point, &centroid));
            if distance < *slot {
                *slot = distance;
            }
        }

        centroids.push(centroid);
    }

    centroids
}
