//! Fragmentation under node removal.
//!
//! Nodes are removed one at a time, either in descending centrality order
//! (targeted) or in a seeded random order (random). After `k` removals the
//! curve records `s_k`, the largest remaining component as a fraction of the
//! original node count. Curves are computed backwards: start from the empty
//! graph, re-insert nodes in reverse removal order, and track the giant
//! component with union-find.
//!
//! The systemic risk score compares the targeted curve with the ideal
//! `ideal_k = (N-k)/N` (removal only ever costs the removed node). The worst
//! case is a connected graph that shatters into singletons at the first
//! removal, `s_k = 1/N` for `0 < k < N`. Fragmentation already present
//! before any removal (`s_0 < 1`) adds to the deficit:
//!
//! ```text
//! score = ((1 − s_0) + Σ_{0<k<N} (ideal_k − s_k)) / Σ_{0<k<N} (ideal_k − 1/N)
//! ```
//!
//! clamped to `[0, 1]`. 0 means removal never fragments the graph; 1 means
//! the first removal leaves only singletons, or the graph starts out that
//! fragmented. An edgeless graph of two or more nodes therefore scores 1,
//! and a graph of fewer than two nodes scores 0.

use fixedbitset::FixedBitSet;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::Serialize;
use strife_core::CentralityMetric;
use strife_core::config::RobustnessConfig;
use tracing::{debug, instrument, warn};

use crate::graph::ConflictGraph;
use crate::metrics::CentralityScores;

/// Mixed into the configured seed so random removal never replays the
/// diffusion trials' stream when both sections share a seed value.
const REMOVAL_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// RNG for random-removal trial `trial`.
fn removal_rng(seed: u64, trial: usize) -> StdRng {
    StdRng::seed_from_u64((seed ^ REMOVAL_STREAM).wrapping_add(trial as u64))
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RobustnessReport {
    pub systemic_risk_score: f64,
    pub random_strategy_score: f64,
    pub targeted_metric: CentralityMetric,
    /// `s_k` for `k = 0..=N` under targeted removal.
    pub targeted_curve: Vec<f64>,
    /// Mean `s_k` over random trials.
    pub random_curve: Vec<f64>,
    pub random_trials: usize,
    pub targeted_order: Vec<String>,
    pub articulation_points: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RobustnessAnalyzer {
    config: RobustnessConfig,
}

impl RobustnessAnalyzer {
    #[must_use]
    pub const fn new(config: RobustnessConfig) -> Self {
        Self { config }
    }

    #[must_use]
    #[instrument(skip_all, fields(nodes = graph.node_count()))]
    pub fn analyze(&self, graph: &ConflictGraph, centrality: &CentralityScores) -> RobustnessReport {
        let n = graph.node_count();
        let order = self.targeted_order(graph, centrality);
        let targeted_curve = giant_component_curve(graph, &order);

        let random_curve = self.random_curve(graph);
        let report = RobustnessReport {
            systemic_risk_score: risk_score(&targeted_curve),
            random_strategy_score: risk_score(&random_curve),
            targeted_metric: self.config.targeted_metric,
            targeted_curve,
            random_curve,
            random_trials: if n == 0 { 0 } else { self.config.random_trials },
            targeted_order: order.iter().map(|&i| graph.node_id(i).to_string()).collect(),
            articulation_points: articulation_points(graph)
                .into_iter()
                .map(|i| graph.node_id(i).to_string())
                .collect(),
        };
        debug!(
            targeted = report.systemic_risk_score,
            random = report.random_strategy_score,
            "robustness computed"
        );
        report
    }

    /// Removal order from the configured centrality ranking. Falls back to
    /// degree order if the scores do not cover the graph.
    fn targeted_order(&self, graph: &ConflictGraph, centrality: &CentralityScores) -> Vec<usize> {
        let order: Vec<usize> = centrality
            .ranking(self.config.targeted_metric)
            .iter()
            .filter_map(|r| graph.index_of(&r.id))
            .collect();
        if order.len() == graph.node_count() {
            return order;
        }

        warn!(
            have = order.len(),
            need = graph.node_count(),
            "centrality scores incomplete; targeting by degree"
        );
        let mut fallback: Vec<usize> = (0..graph.node_count()).collect();
        fallback.sort_by(|&a, &b| graph.degree(b).cmp(&graph.degree(a)).then(a.cmp(&b)));
        fallback
    }

    #[allow(clippy::cast_precision_loss)]
    fn random_curve(&self, graph: &ConflictGraph) -> Vec<f64> {
        let n = graph.node_count();
        if n == 0 || self.config.random_trials == 0 {
            return giant_component_curve(graph, &[]);
        }

        let curves: Vec<Vec<f64>> = (0..self.config.random_trials)
            .into_par_iter()
            .map(|t| {
                let mut rng = removal_rng(self.config.seed, t);
                let mut order: Vec<usize> = (0..n).collect();
                order.shuffle(&mut rng);
                giant_component_curve(graph, &order)
            })
            .collect();

        let trials = curves.len() as f64;
        let mut mean = vec![0.0; n + 1];
        for curve in &curves {
            for (slot, s) in mean.iter_mut().zip(curve) {
                *slot += s / trials;
            }
        }
        mean
    }
}

/// `s_k` for `k = 0..=N` when nodes are removed in `order`.
///
/// `order` must be a permutation of the node indices; an empty order on an
/// empty graph yields `[0.0]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn giant_component_curve(graph: &ConflictGraph, order: &[usize]) -> Vec<f64> {
    let n = graph.node_count();
    if n == 0 {
        return vec![0.0];
    }

    let mut sets = DisjointSets::new(n);
    let mut present = FixedBitSet::with_capacity(n);
    let mut largest = 0usize;
    let mut curve = vec![0.0; n + 1];

    // curve[k] is the state with order[k..] present.
    for k in (0..order.len()).rev() {
        let v = order[k];
        present.insert(v);
        largest = largest.max(1);
        for &(u, _) in graph.neighbors(v) {
            if present.contains(u) {
                largest = largest.max(sets.union(u, v));
            }
        }
        curve[k] = largest as f64 / n as f64;
    }
    curve
}

/// Fragility of a removal curve, clamped to `[0, 1]`; 0 below two nodes.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn risk_score(curve: &[f64]) -> f64 {
    let n = curve.len().saturating_sub(1);
    if n < 2 {
        return 0.0;
    }
    let nf = n as f64;
    let already_split = (1.0 - curve[0]).max(0.0);
    let (deficit, worst) = curve[1..n]
        .iter()
        .enumerate()
        .fold((already_split, 0.0), |(d, w), (i, &s)| {
            let ideal = (nf - (i + 1) as f64) / nf;
            (d + (ideal - s), w + (ideal - 1.0 / nf))
        });
    // Two nodes: no removal can split anything, only the start state counts.
    if worst <= 0.0 {
        return if already_split > 0.0 { 1.0 } else { 0.0 };
    }
    (deficit / worst).clamp(0.0, 1.0)
}

/// Cut vertices via iterative Tarjan low-link, ascending.
#[must_use]
pub fn articulation_points(graph: &ConflictGraph) -> Vec<usize> {
    let n = graph.node_count();
    let mut disc = vec![usize::MAX; n];
    let mut low = vec![0usize; n];
    let mut is_cut = FixedBitSet::with_capacity(n);
    let mut timer = 0;

    for root in 0..n {
        if disc[root] != usize::MAX {
            continue;
        }
        disc[root] = timer;
        low[root] = timer;
        timer += 1;
        let mut root_children = 0;
        // (node, parent, next neighbor position)
        let mut stack: Vec<(usize, usize, usize)> = vec![(root, usize::MAX, 0)];

        while let Some(frame) = stack.last_mut() {
            let (v, parent, pos) = *frame;
            if let Some(&(w, _)) = graph.neighbors(v).get(pos) {
                frame.2 += 1;
                if disc[w] == usize::MAX {
                    disc[w] = timer;
                    low[w] = timer;
                    timer += 1;
                    if v == root {
                        root_children += 1;
                    }
                    stack.push((w, v, 0));
                } else if w != parent {
                    low[v] = low[v].min(disc[w]);
                }
            } else {
                stack.pop();
                if parent != usize::MAX {
                    low[parent] = low[parent].min(low[v]);
                    if parent != root && low[v] >= disc[parent] {
                        is_cut.insert(parent);
                    }
                }
            }
        }

        if root_children > 1 {
            is_cut.insert(root);
        }
    }

    is_cut.ones().collect()
}

/// Union-find with union by size and path halving.
struct DisjointSets {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets of `a` and `b`; returns the size of the merged set.
    fn union(&mut self, a: usize, b: usize) -> usize {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return self.size[ra];
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
        self.size[ra]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    #[test]
    fn removal_stream_differs_from_plain_seed_stream() {
        for trial in 0..4 {
            let mut removal = removal_rng(42, trial);
            let mut plain = StdRng::seed_from_u64(42 + trial as u64);
            assert_ne!(removal.next_u64(), plain.next_u64());
        }
        let mut again = removal_rng(42, 0);
        assert_eq!(again.next_u64(), removal_rng(42, 0).next_u64());
    }

    #[test]
    fn ideal_curve_scores_zero() {
        // N = 4, graph never splits.
        let curve = [1.0, 0.75, 0.5, 0.25, 0.0];
        assert!(risk_score(&curve).abs() < 1e-12);
    }

    #[test]
    fn immediate_shatter_scores_one() {
        let curve = [1.0, 0.25, 0.25, 0.25, 0.0];
        assert!((risk_score(&curve) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn star_losing_its_hub_scores_one() {
        // N = 5: every node is a singleton after the first removal.
        let curve = [1.0, 0.2, 0.2, 0.2, 0.2, 0.0];
        assert!((risk_score(&curve) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn partial_split_is_between_bounds() {
        // Path of five, center removed first: deficit 0.8 of 1.2.
        let curve = [1.0, 0.4, 0.4, 0.2, 0.2, 0.0];
        assert!((risk_score(&curve) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn already_fragmented_graphs_score_one() {
        assert!((risk_score(&[0.5, 0.5, 0.0]) - 1.0).abs() < f64::EPSILON);
        assert!((risk_score(&[1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0, 0.0]) - 1.0).abs() < f64::EPSILON);
        assert!(risk_score(&[1.0, 0.5, 0.0]).abs() < f64::EPSILON);
    }

    #[test]
    fn tiny_graphs_score_zero() {
        assert!(risk_score(&[0.0]).abs() < f64::EPSILON);
        assert!(risk_score(&[1.0, 0.0]).abs() < f64::EPSILON);
    }

    #[test]
    fn union_reports_merged_size() {
        let mut sets = DisjointSets::new(4);
        assert_eq!(sets.union(0, 1), 2);
        assert_eq!(sets.union(2, 3), 2);
        assert_eq!(sets.union(1, 3), 4);
        assert_eq!(sets.union(0, 2), 4);
    }
}
