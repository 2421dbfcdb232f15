use crate::search::SearchResult;
use crate::types::DocumentId;
use crate::vector::{VectorError, cosine_similarity};

/// Ranks candidates by cosine similarity to `query`, best first.
///
/// Negative similarities are reported as 0 so every score is non-negative.
/// Ties keep ascending document id order.
///
/// # Errors
/// [`VectorError::DimensionMismatch`] when any candidate vector has a
/// different length than the query. No partial ranking is returned.
pub fn rank_by_similarity(
    query: &[f32],
    candidates: &[(DocumentId, Vec<f32>)],
    limit: usize,
) -> Result<Vec<SearchResult>, VectorError> {
    let mut results = candidates
        .iter()
        .map(|(id, vector)| {
            let score = cosine_similarity(query, vector)?.max(0.0);
            Ok(SearchResult::new(*id, score))
        })
        .collect::<Result<Vec<_>, VectorError>>()?;

    super::sort_by_score(&mut results);
    results.truncate(limit);
    Ok(results)
}
