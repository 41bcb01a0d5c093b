//! Betweenness centrality via Brandes' algorithm.
//!
//! # Algorithm
//!
//! For each source node `s`:
//!
//! 1. BFS to compute hop distances and shortest-path counts `σ`.
//! 2. Pop nodes in reverse BFS order and accumulate dependencies
//!    `δ(v) += σ(v)/σ(w) · (1 + δ(w))` for each predecessor `v` of `w`.
//!
//! Edges are unweighted hops here; conflict strength does not shorten a
//! path. Each undirected pair is visited from both ends, so the raw sum is
//! halved, then scaled by `2 / ((N-1)(N-2))` into `[0, 1]`.
//!
//! Complexity: O(V · E).

use std::collections::VecDeque;

use tracing::instrument;

use crate::graph::ConflictGraph;

/// Normalized betweenness for every node; all zeros for fewer than 3 nodes.
#[must_use]
#[instrument(skip_all, fields(nodes = graph.node_count()))]
#[allow(clippy::cast_precision_loss)]
pub fn betweenness_centrality(graph: &ConflictGraph) -> Vec<f64> {
    let n = graph.node_count();
    let mut cb = vec![0.0; n];
    if n < 3 {
        return cb;
    }

    let mut stack: Vec<usize> = Vec::with_capacity(n);
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0_f64; n];
    let mut dist: Vec<i64> = vec![-1; n];
    let mut delta = vec![0.0_f64; n];
    let mut queue = VecDeque::with_capacity(n);

    for s in 0..n {
        stack.clear();
        for p in &mut predecessors {
            p.clear();
        }
        sigma.fill(0.0);
        dist.fill(-1);
        delta.fill(0.0);

        sigma[s] = 1.0;
        dist[s] = 0;
        queue.push_back(s);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &(w, _) in graph.neighbors(v) {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                delta[v] += (sigma[v] / sigma[w]) * (1.0 + delta[w]);
            }
            if w != s {
                cb[w] += delta[w];
            }
        }
    }

    // Halve for double counting, then apply 2/((n-1)(n-2)): the factors cancel.
    let scale = 1.0 / ((n - 1) as f64 * (n - 2) as f64);
    for score in &mut cb {
        *score *= scale;
    }
    cb
}
