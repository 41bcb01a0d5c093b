//! Eigenvector centrality via power iteration.
//!
//! # Algorithm
//!
//! Iterate `x ← (A + I)·x / ‖(A + I)·x‖₂` from a uniform start, with `A` the
//! weighted adjacency matrix. The identity shift keeps bipartite graphs from
//! oscillating between two vectors. Iteration stops once the L2 change
//! between consecutive vectors drops below the tolerance.
//!
//! A graph without edges, or whose edges all weigh 0, has no meaningful
//! dominant eigenvector; every node scores 0 and the result counts as
//! converged.

use tracing::{debug, instrument};

use crate::error::AnalysisError;
use crate::graph::ConflictGraph;

/// Converged eigenvector scores.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenvectorResult {
    /// Scores indexed by node, unit L2 norm (or all zeros).
    pub scores: Vec<f64>,
    pub iterations: usize,
}

/// Power iteration capped at `max_iter`.
///
/// # Errors
///
/// Returns [`AnalysisError::NonConvergence`] if the change is still above
/// `tolerance` after `max_iter` iterations.
#[instrument(skip(graph), fields(nodes = graph.node_count()))]
#[allow(clippy::cast_precision_loss)]
pub fn eigenvector_centrality(
    graph: &ConflictGraph,
    max_iter: usize,
    tolerance: f64,
) -> Result<EigenvectorResult, AnalysisError> {
    let n = graph.node_count();
    if graph.total_weight() <= 0.0 {
        return Ok(EigenvectorResult {
            scores: vec![0.0; n],
            iterations: 0,
        });
    }

    let mut x = vec![1.0 / (n as f64).sqrt(); n];
    let mut next = vec![0.0; n];
    let mut delta = f64::INFINITY;

    for iteration in 1..=max_iter {
        for (v, slot) in next.iter_mut().enumerate() {
            *slot = x[v] + graph.neighbors(v).iter().map(|&(u, w)| w * x[u]).sum::<f64>();
        }
        let norm = next.iter().map(|s| s * s).sum::<f64>().sqrt();
        if norm > 0.0 {
            for s in &mut next {
                *s /= norm;
            }
        }
        delta = x
            .iter()
            .zip(&next)
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt();
        std::mem::swap(&mut x, &mut next);

        if delta < tolerance {
            debug!(iteration, delta, "eigenvector converged");
            return Ok(EigenvectorResult {
                scores: x,
                iterations: iteration,
            });
        }
    }

    Err(AnalysisError::NonConvergence {
        iterations: max_iter,
        delta,
    })
}
