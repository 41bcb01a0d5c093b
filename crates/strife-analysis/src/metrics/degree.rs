//! Degree and closeness centrality.

use tracing::instrument;

use crate::graph::ConflictGraph;

/// `degree / (N - 1)`; all zeros for fewer than two nodes.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn degree_centrality(graph: &ConflictGraph) -> Vec<f64> {
    let n = graph.node_count();
    if n < 2 {
        return vec![0.0; n];
    }
    let denom = (n - 1) as f64;
    (0..n).map(|i| graph.degree(i) as f64 / denom).collect()
}

/// Wasserman–Faust closeness: `(r / Σd) · (r / (N - 1))`, where `r` counts
/// nodes reachable from `v` (excluding `v`). Isolated nodes score 0.
#[must_use]
#[instrument(skip_all, fields(nodes = graph.node_count()))]
#[allow(clippy::cast_precision_loss)]
pub fn closeness_centrality(graph: &ConflictGraph) -> Vec<f64> {
    let n = graph.node_count();
    if n < 2 {
        return vec![0.0; n];
    }
    (0..n)
        .map(|v| {
            let (reachable, total) = graph
                .bfs_distances(v)
                .iter()
                .flatten()
                .filter(|&&d| d > 0)
                .fold((0usize, 0usize), |(r, t), &d| (r + 1, t + d));
            if total == 0 {
                0.0
            } else {
                let r = reachable as f64;
                (r / total as f64) * (r / (n - 1) as f64)
            }
        })
        .collect()
}
