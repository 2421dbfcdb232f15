//! Automatic selection of the cluster count with the elbow heuristic.
//!
//! The selector runs the clustering engine for every candidate k, records
//! the inertia curve, and picks the k with the sharpest bend (largest
//! positive discrete second derivative).

use crate::vector::clustering::{ClusteringError, cluster_with_rng, inertia};
use rand::Rng;
use tracing::debug;

/// Default upper bound for the candidate k values.
pub const DEFAULT_MAX_K: usize = 10;

/// Iteration cap used for each clustering run during the scan.
pub const SCAN_MAX_ITERATIONS: usize = 50;

/// k returned when the inertia curve has no positive bend.
const FALLBACK_K: usize = 2;

/// Inertia values from an elbow scan, `inertias[i]` belongs to `k = i + 1`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElbowScan {
    pub inertias: Vec<f32>,
}

impl ElbowScan {
    /// Discrete second derivative at every interior index, paired with its k.
    #[must_use]
    pub fn second_derivatives(&self) -> Vec<(usize, f32)> {
        self.inertias
            .windows(3)
            .enumerate()
            .map(|(offset, w)| (offset + 2, w[0] - 2.0 * w[1] + w[2]))
            .collect()
    }

    /// k at the sharpest positive bend, or 2 when there is none.
    #[must_use]
    pub fn elbow(&self) -> usize {
        let mut best_k = FALLBACK_K;
        let mut best_value = 0.0f32;

        for (k, value) in self.second_derivatives() {
            if value > best_value {
                best_value = value;
                best_k = k;
            }
        }

        best_k
    }
}

/// Suggests a cluster count using the thread-local random generator.
pub fn suggest_k(points: &[Vec<f32>], max_k: usize) -> Result<usize, ClusteringError> {
    suggest_k_with_rng(points, max_k, &mut rand::rng())
}

/// Suggests a cluster count for `points` with the elbow heuristic.
///
/// Fewer than four points are not worth scanning: the result is
/// `max(1, points.len())`. Otherwise k is searched in
/// `1..=min(max_k, points.len() / 2)`.
pub fn suggest_k_with_rng<R: Rng + ?Sized>(
    points: &[Vec<f32>],
    max_k: usize,
    rng: &mut R,
) -> Result<usize, ClusteringError> {
    if points.len() <= 3 {
        return Ok(points.len().max(1));
    }

    let scan = elbow_scan(points, max_k, rng)?;
    let k = scan.elbow();

    debug!(
        "elbow scan over {} candidates picked k={k} (inertias: {:?})",
        scan.inertias.len(),
        scan.inertias
    );

    Ok(k)
}

/// Runs the clustering engine for every candidate k and records inertia.
pub fn elbow_scan<R: Rng + ?Sized>(
    points: &[Vec<f32>],
    max_k: usize,
    rng: &mut R,
) -> Result<ElbowScan, ClusteringError> {
    let bound = max_k.min(points.len() / 2);
    let mut inertias = Vec::with_capacity(bound);

    for k in 1..=bound {
        let result = cluster_with_rng(points, k, SCAN_MAX_ITERATIONS, rng)?;
        inertias.push(inertia(points, &result));
    }

    Ok(ElbowScan { inertias })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn blobs(centers: &[(f32, f32)], per_blob: usize) -> Vec<Vec<f32>> {
        let mut points = Vec::new();
        for &(x, y) in centers {
            for i in 0..per_blob {
                let jitter = (i as f32) * 0.05;
                points.push(vec![x + jitter, y - jitter]);
            }
        }
        points
    }

    #[test]
    fn test_small_inputs_skip_scan() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(suggest_k_with_rng(&[], 10, &mut rng).unwrap(), 1);
        assert_eq!(suggest_k_with_rng(&[vec![1.0]], 10, &mut rng).unwrap(), 1);
        assert_eq!(
            suggest_k_with_rng(&[vec![1.0], vec![2.0], vec![3.0]], 10, &mut rng).unwrap(),
            3
        );
    }

    #[test]
    fn test_small_inputs_do_not_validate_dimensions() {
        // No clustering run happens below four points
        let points = vec![vec![1.0], vec![2.0, 3.0]];
        assert_eq!(suggest_k(&points, 10).unwrap(), 2);
    }

    #[test]
    fn test_elbow_picks_sharpest_bend() {
        let scan = ElbowScan {
            inertias: vec![100.0, 40.0, 10.0, 8.0, 7.0],
        };
        // k=2: 100-80+10=30, k=3: 40-20+8=28, k=4: 10-16+7=1
        assert_eq!(scan.elbow(), 2);

        let scan = ElbowScan {
            inertias: vec![100.0, 90.0, 20.0, 18.0],
        };
        // k=2: 100-180+20=-60, k=3: 90-40+18=68
        assert_eq!(scan.elbow(), 3);
    }

    #[test]
    fn test_elbow_defaults_to_two() {
        // Linear decrease has no positive bend
        let scan = ElbowScan {
            inertias: vec![40.0, 30.0, 20.0, 10.0],
        };
        assert_eq!(scan.elbow(), 2);

        // Too short for an interior point
        let scan = ElbowScan {
            inertias: vec![40.0, 30.0],
        };
        assert_eq!(scan.elbow(), 2);
        assert!(scan.second_derivatives().is_empty());
    }

    #[test]
    fn test_scan_bound_is_half_the_dataset() {
        let points = blobs(&[(0.0, 0.0), (8.0, 8.0)], 5);
        let mut rng = StdRng::seed_from_u64(11);

        let scan = elbow_scan(&points, 10, &mut rng).unwrap();
        assert_eq!(scan.inertias.len(), 5);

        let scan = elbow_scan(&points, 3, &mut rng).unwrap();
        assert_eq!(scan.inertias.len(), 3);
    }

    #[test]
    fn test_inertia_trends_downward() {
        let points = blobs(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0)], 6);
        let mut rng = StdRng::seed_from_u64(5);

        let scan = elbow_scan(&points, 8, &mut rng).unwrap();

        let first = scan.inertias[0];
        let last = *scan.inertias.last().unwrap();
        assert!(last < first, "inertia should drop as k grows: {scan:?}");

        let increases = scan
            .inertias
            .windows(2)
            .filter(|w| w[1] > w[0] + 1e-3)
            .count();
        assert!(increases <= scan.inertias.len() / 2);
    }

    #[test]
    fn test_suggest_k_stays_in_bounds() {
        let points = blobs(&[(0.0, 0.0), (20.0, 0.0), (0.0, 20.0)], 8);

        for seed in 0..5 {
            let mut rng = StdRng::seed_from_u64(seed);
            let k = suggest_k_with_rng(&points, DEFAULT_MAX_K, &mut rng).unwrap();
            assert!((2..=DEFAULT_MAX_K).contains(&k), "k={k}");
        }
    }
}
