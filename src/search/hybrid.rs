use crate::config::SearchConfig;
use crate::search::SearchResult;
use crate::types::DocumentId;
use std::collections::{HashMap, HashSet};
use std::fmt::Display;

/// Default multiplier for vector hits the lexical index also found.
pub const DEFAULT_VECTOR_BOOST: f32 = 1.2;

/// Default multiplier for hits found only by the lexical index.
pub const DEFAULT_LEXICAL_WEIGHT: f32 = 0.5;

/// Score multipliers applied while merging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeWeights {
    pub vector_boost: f32,
    pub lexical_weight: f32,
}

impl Default for MergeWeights {
    fn default() -> Self {
        Self {
            vector_boost: DEFAULT_VECTOR_BOOST,
            lexical_weight: DEFAULT_LEXICAL_WEIGHT,
        }
    }
}

impl From<&SearchConfig> for MergeWeights {
    fn from(config: &SearchConfig) -> Self {
        Self {
            vector_boost: config.vector_boost,
            lexical_weight: config.lexical_weight,
        }
    }
}

/// Result of the lexical half of a hybrid query.
///
/// A failed lexical search does not fail the hybrid query; it merges as if
/// there were no lexical matches, but the failure stays visible here.
#[derive(Debug, Clone, PartialEq)]
pub enum LexicalOutcome {
    Matches(Vec<SearchResult>),
    Failed { reason: String },
}

impl LexicalOutcome {
    /// Converts a lexical backend result, turning errors into `Failed`.
    pub fn from_result<E: Display>(result: Result<Vec<(DocumentId, f32)>, E>) -> Self {
        match result {
            Ok(hits) => Self::Matches(
                hits.into_iter()
                    .map(|(id, score)| SearchResult::new(id, score))
                    .collect(),
            ),
            Err(e) => Self::Failed {
                reason: e.to_string(),
            },
        }
    }

    /// Matches to merge; empty for a failed search.
    pub fn matches(&self) -> &[SearchResult] {
        match self {
            Self::Matches(matches) => matches,
            Self::Failed { .. } => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Merges vector and lexical results with the default weights.
pub fn merge(
    vector_results: &[SearchResult],
    lexical: &LexicalOutcome,
    limit: usize,
) -> Vec<SearchResult> {
    merge_with_weights(vector_results, lexical, limit, MergeWeights::default())
}

/// Merges vector and lexical results into one ranking.
///
/// Every vector result is kept, boosted when the lexical side also found
/// it. Lexical-only results are added with their absolute score
/// down-weighted. Each document appears once with its best score.
pub fn merge_with_weights(
    vector_results: &[SearchResult],
    lexical: &LexicalOutcome,
    limit: usize,
    weights: MergeWeights,
) -> Vec<SearchResult> {
    let lexical_matches = lexical.matches();
    let lexical_ids: HashSet<DocumentId> =
        lexical_matches.iter().map(|r| r.document_id).collect();

    let mut best: HashMap<DocumentId, f32> = HashMap::new();
    let mut keep_best = |id: DocumentId, score: f32| {
        best.entry(id)
            .and_modify(|current| *current = current.max(score))
            .or_insert(score);
    };

    for result in vector_results {
        let score = if lexical_ids.contains(&result.document_id) {
            result.score * weights.vector_boost
        } else {
            result.score
        };
        keep_best(result.document_id, score);
    }

    let vector_ids: HashSet<DocumentId> = vector_results.iter().map(|r| r.document_id).collect();
    for result in lexical_matches {
        if !vector_ids.contains(&result.document_id) {
            keep_best(result.document_id, result.score.abs() * weights.lexical_weight);
        }
    }

    let mut merged: Vec<SearchResult> = best
        .into_iter()
        .map(|(id, score)| SearchResult::new(id, score))
        .collect();
    super::sort_by_score(&mut merged);
    merged.truncate(limit);
    merged
}
