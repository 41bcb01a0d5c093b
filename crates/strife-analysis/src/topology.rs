//! Whole-graph structural statistics.
//!
//! Density, clustering, component structure, and hop-distance statistics of
//! the largest component. Weights are ignored here: every measure counts
//! edges, not conflict strength.

use std::collections::VecDeque;

use fixedbitset::FixedBitSet;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::graph::ConflictGraph;
use crate::stats::percentile;

/// Degree distribution summary.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DegreeSummary {
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

/// Topology section of the report.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TopologyMetrics {
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
    /// Transitivity: closed triplets over connected triplets.
    pub global_clustering: f64,
    pub average_clustering: f64,
    pub component_count: usize,
    /// Component sizes, descending.
    pub component_sizes: Vec<usize>,
    pub largest_component_size: usize,
    pub isolated_nodes: usize,
    /// Mean hop distance over ordered reachable pairs of the largest component.
    pub average_path_length: Option<f64>,
    pub diameter: Option<usize>,
    pub degree: DegreeSummary,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TopologyAnalyzer;

impl TopologyAnalyzer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    #[must_use]
    #[allow(clippy::unused_self)]
    #[instrument(skip_all, fields(nodes = graph.node_count()))]
    pub fn analyze(&self, graph: &ConflictGraph) -> TopologyMetrics {
        let n = graph.node_count();
        let components = graph.connected_components();

        // Lowest-member ordering means the first maximum holds the lowest id.
        let largest = components
            .iter()
            .fold(None::<&Vec<usize>>, |best, c| match best {
                Some(b) if b.len() >= c.len() => Some(b),
                _ => Some(c),
            });

        let mut component_sizes: Vec<usize> = components.iter().map(Vec::len).collect();
        component_sizes.sort_unstable_by(|a, b| b.cmp(a));

        let (global_clustering, average_clustering) = clustering(graph);
        let (average_path_length, diameter) = largest.map_or((None, None), |c| path_stats(graph, c));

        let metrics = TopologyMetrics {
            node_count: n,
            edge_count: graph.edge_count(),
            density: density(n, graph.edge_count()),
            global_clustering,
            average_clustering,
            component_count: components.len(),
            largest_component_size: component_sizes.first().copied().unwrap_or(0),
            component_sizes,
            isolated_nodes: (0..n).filter(|&i| graph.degree(i) == 0).count(),
            average_path_length,
            diameter,
            degree: degree_summary(graph),
        };
        debug!(
            density = metrics.density,
            components = metrics.component_count,
            "topology computed"
        );
        metrics
    }
}

/// `2E / (N(N-1))`, 0 for fewer than two nodes.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn density(nodes: usize, edges: usize) -> f64 {
    if nodes < 2 {
        return 0.0;
    }
    (2 * edges) as f64 / (nodes * (nodes - 1)) as f64
}

/// Triangles through each node.
fn triangles(graph: &ConflictGraph) -> Vec<usize> {
    let n = graph.node_count();
    let mut marked = FixedBitSet::with_capacity(n);
    let mut counts = vec![0; n];

    for v in 0..n {
        for &(u, _) in graph.neighbors(v) {
            marked.insert(u);
        }
        let mut t = 0;
        for &(u, _) in graph.neighbors(v) {
            for &(w, _) in graph.neighbors(u) {
                if w > u && marked.contains(w) {
                    t += 1;
                }
            }
        }
        counts[v] = t;
        for &(u, _) in graph.neighbors(v) {
            marked.set(u, false);
        }
    }
    counts
}

#[allow(clippy::cast_precision_loss)]
fn clustering(graph: &ConflictGraph) -> (f64, f64) {
    let n = graph.node_count();
    if n == 0 {
        return (0.0, 0.0);
    }
    let tri = triangles(graph);

    let mut closed = 0usize;
    let mut triplets = 0usize;
    let mut local_sum = 0.0;
    for (v, &t) in tri.iter().enumerate() {
        let d = graph.degree(v);
        if d < 2 {
            continue;
        }
        let pairs = d * (d - 1) / 2;
        closed += t;
        triplets += pairs;
        local_sum += t as f64 / pairs as f64;
    }

    let global = if triplets == 0 {
        0.0
    } else {
        closed as f64 / triplets as f64
    };
    (global, local_sum / n as f64)
}

#[allow(clippy::cast_precision_loss)]
fn path_stats(graph: &ConflictGraph, component: &[usize]) -> (Option<f64>, Option<usize>) {
    if component.len() < 2 {
        return (None, None);
    }
    let n = graph.node_count();
    let mut total = 0usize;
    let mut pairs = 0usize;
    let mut diameter = 0usize;
    let mut dist: Vec<usize> = vec![usize::MAX; n];
    let mut queue = VecDeque::new();

    for &source in component {
        dist.fill(usize::MAX);
        dist[source] = 0;
        queue.push_back(source);
        while let Some(u) = queue.pop_front() {
            for &(v, _) in graph.neighbors(u) {
                if dist[v] == usize::MAX {
                    dist[v] = dist[u] + 1;
                    total += dist[v];
                    pairs += 1;
                    diameter = diameter.max(dist[v]);
                    queue.push_back(v);
                }
            }
        }
    }

    (Some(total as f64 / pairs as f64), Some(diameter))
}

#[allow(clippy::cast_precision_loss)]
fn degree_summary(graph: &ConflictGraph) -> DegreeSummary {
    let n = graph.node_count();
    if n == 0 {
        return DegreeSummary::default();
    }
    let mut degrees: Vec<usize> = (0..n).map(|i| graph.degree(i)).collect();
    degrees.sort_unstable();
    let sorted: Vec<f64> = degrees.iter().map(|&d| d as f64).collect();

    DegreeSummary {
        min: degrees[0],
        max: degrees[n - 1],
        mean: sorted.iter().sum::<f64>() / n as f64,
        p25: percentile(&sorted, 25.0),
        p50: percentile(&sorted, 50.0),
        p75: percentile(&sorted, 75.0),
        p90: percentile(&sorted, 90.0),
    }
}
