//! Human-readable labels for clusters.
//!
//! Each cluster is named after its representative document: the member
//! closest to the cluster centroid. The text is cleaned up (URLs removed,
//! whitespace collapsed) and shortened to fit a list view.

use crate::vector::squared_euclidean_distance;
use regex::Regex;
use std::sync::LazyLock;

/// Label used for clusters without members.
pub const EMPTY_CLUSTER_LABEL: &str = "Empty cluster";

/// Maximum label length in characters, not counting the ellipsis.
pub const MAX_LABEL_CHARS: usize = 60;

const ELLIPSIS: &str = "...";

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:https?://|www\.)\S+").expect("valid URL pattern"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Derives one label per cluster id in `0..k`.
///
/// # Arguments
/// * `points` - Embeddings, indexed like `texts` and `assignments`
/// * `texts` - Raw document texts
/// * `assignments` - Cluster id per document
/// * `k` - Number of clusters
/// * `centroids` - Optional centroids used to pick the representative
///
/// Without centroids the first assigned document (by input index) represents
/// its cluster.
pub fn label_clusters(
    points: &[Vec<f32>],
    texts: &[String],
    assignments: &[usize],
    k: usize,
    centroids: Option<&[Vec<f32>]>,
) -> Vec<String> {
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); k];
    for (index, &cluster) in assignments.iter().enumerate() {
        if let Some(slot) = members.get_mut(cluster) {
            slot.push(index);
        }
    }

    members
        .iter()
        .enumerate()
        .map(|(cluster, indices)| {
            if indices.is_empty() {
                return EMPTY_CLUSTER_LABEL.to_string();
            }

            let centroid = centroids.and_then(|c| c.get(cluster));
            let representative = centroid
                .and_then(|centroid| representative_index(points, indices, centroid))
                .unwrap_or(indices[0]);

            let text = texts.get(representative).map(String::as_str).unwrap_or("");
            let label = clean_label(text);
            if label.is_empty() {
                fallback_label(cluster)
            } else {
                label
            }
        })
        .collect()
}

/// Member index with the smallest squared distance to `centroid`.
///
/// Members whose dimension differs from the centroid are skipped.
fn representative_index(points: &[Vec<f32>], members: &[usize], centroid: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;

    for &index in members {
        let Some(point) = points.get(index) else {
            continue;
        };
        if point.len() != centroid.len() {
            continue;
        }

        let distance = squared_euclidean_distance(point, centroid);
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((index, distance));
        }
    }

    best.map(|(index, _)| index)
}

/// Strips URLs, collapses whitespace, and truncates to [`MAX_LABEL_CHARS`].
pub fn clean_label(text: &str) -> String {
    let without_urls = URL_PATTERN.replace_all(text, " ");
    let collapsed = WHITESPACE.replace_all(&without_urls, " ");
    let trimmed = collapsed.trim();

    if trimmed.chars().count() <= MAX_LABEL_CHARS {
        return trimmed.to_string();
    }

    let mut label: String = trimmed.chars().take(MAX_LABEL_CHARS).collect();
    label.truncate(label.trim_end().len());
    label.push_str(ELLIPSIS);
    label
}

/// Numbered placeholder for a cluster whose text cleans to nothing.
pub fn fallback_label(cluster: usize) -> String {
    format!("Cluster {}", cluster + 1)
}
