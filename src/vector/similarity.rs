//! Cosine similarity between embedding vectors.

use crate::vector::types::{VectorError, ensure_same_dimension};

/// Computes cosine similarity between two vectors.
///
/// # Returns
/// * Similarity in range [-1, 1], where 1 is most similar
/// * 0.0 when either vector has zero magnitude
///
/// # Errors
/// Returns [`VectorError::DimensionMismatch`] when the vectors differ in length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, VectorError> {
    ensure_same_dimension(a, b)?;

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = magnitude(a);
    let norm_b = magnitude(b);

    if norm_a == 0.0 || norm_b == 0.0 {
        Ok(0.0)
    } else {
        Ok(dot_product / (norm_a * norm_b))
    }
}

/// Euclidean norm of a vector.
pub fn magnitude(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-6;

    #[test]
    fn test_cosine_similarity() {
        // Identical vectors
        let a = [1.0, 2.0, 3.0];
        assert!((cosine_similarity(&a, &a).unwrap() - 1.0).abs() < TOLERANCE);

        // Orthogonal vectors
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(sim.abs() < TOLERANCE);

        // Opposite vectors
        let sim = cosine_similarity(&[1.0, 2.0, 3.0], &[-1.0, -2.0, -3.0]).unwrap();
        assert!((sim + 1.0).abs() < TOLERANCE);

        // Zero vector
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_similarity_is_symmetric() {
        let a = [0.3, -1.2, 4.0, 0.01];
        let b = [2.5, 0.4, -0.7, 1.0];
        let ab = cosine_similarity(&a, &b).unwrap();
        let ba = cosine_similarity(&b, &a).unwrap();
        assert!((ab - ba).abs() < TOLERANCE);
    }

    #[test]
    fn test_self_similarity_of_unnormalized_vector() {
        let a = [12.0, -7.5, 0.25];
        assert!((cosine_similarity(&a, &a).unwrap() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        assert!(matches!(
            cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]),
            Err(VectorError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_magnitude() {
        assert!((magnitude(&[3.0, 4.0]) - 5.0).abs() < TOLERANCE);
        assert_eq!(magnitude(&[]), 0.0);
    }
}
