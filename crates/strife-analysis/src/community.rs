//! Community detection by Louvain modularity optimization.
//!
//! # Algorithm
//!
//! 1. **Local phase**: visit nodes in ascending index order and move each to
//!    the neighboring community with the largest gain
//!    `k_i,in − γ·Σ_tot·k_i / 2m`. A node leaves its community only when the
//!    best gain beats staying by more than [`MOVE_EPSILON`]; equal candidates
//!    resolve to the lowest community id. Passes repeat until nothing moves
//!    or `max_passes` is reached.
//! 2. **Aggregation**: collapse each community into a super-node numbered by
//!    its lowest member. Inter-community weights are summed and
//!    intra-community weight becomes a self-loop. Then repeat (1).
//!
//! Stops when a local phase moves nothing, when modularity improves by less
//! than `min_modularity_gain`, or after `max_levels` levels.
//!
//! Every step is deterministic, so identical graphs always get identical
//! partitions.

use std::collections::BTreeMap;

use serde::Serialize;
use strife_core::config::CommunityConfig;
use tracing::{debug, instrument};

use crate::graph::ConflictGraph;

/// Minimum gain over staying put before a node moves.
pub const MOVE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunitySummary {
    pub id: usize,
    pub members: Vec<String>,
    pub size: usize,
    /// Sum of edge weights with both ends inside the community.
    pub internal_weight: f64,
    /// Most common assigned domain among members (ties: lexically first).
    pub dominant_domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CommunityStructure {
    /// Entity id to community id.
    pub assignments: BTreeMap<String, usize>,
    pub community_count: usize,
    pub modularity: f64,
    pub levels: usize,
    pub passes: usize,
    pub communities: Vec<CommunitySummary>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CommunityDetector {
    config: CommunityConfig,
}

/// Working graph at one aggregation level.
struct Level {
    adjacency: Vec<Vec<(usize, f64)>>,
    self_loops: Vec<f64>,
}

impl Level {
    fn from_graph(graph: &ConflictGraph) -> Self {
        let n = graph.node_count();
        Self {
            adjacency: (0..n).map(|i| graph.neighbors(i).to_vec()).collect(),
            self_loops: vec![0.0; n],
        }
    }

    const fn len(&self) -> usize {
        self.self_loops.len()
    }

    /// Weighted degree with self-loops counted twice.
    fn strength(&self, i: usize) -> f64 {
        2.0 * self.self_loops[i] + self.adjacency[i].iter().map(|&(_, w)| w).sum::<f64>()
    }

    /// Collapse `community` (dense ids `0..count`) into a new level.
    fn aggregate(&self, community: &[usize], count: usize) -> Self {
        let mut self_loops = vec![0.0; count];
        let mut links: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); count];

        for i in 0..self.len() {
            let ci = community[i];
            self_loops[ci] += self.self_loops[i];
            for &(j, w) in &self.adjacency[i] {
                let cj = community[j];
                if ci == cj {
                    if i < j {
                        self_loops[ci] += w;
                    }
                } else {
                    *links[ci].entry(cj).or_insert(0.0) += w;
                }
            }
        }

        Self {
            adjacency: links.into_iter().map(|m| m.into_iter().collect()).collect(),
            self_loops,
        }
    }
}

/// Result of one local phase.
struct LocalPhase {
    community: Vec<usize>,
    moved: bool,
    passes: usize,
}

impl CommunityDetector {
    #[must_use]
    pub const fn new(config: CommunityConfig) -> Self {
        Self { config }
    }

    #[must_use]
    #[instrument(skip_all, fields(nodes = graph.node_count(), edges = graph.edge_count()))]
    pub fn detect(&self, graph: &ConflictGraph) -> CommunityStructure {
        let n = graph.node_count();
        let mut membership: Vec<usize> = (0..n).collect();
        let two_m = 2.0 * graph.total_weight();
        let gamma = self.config.resolution;

        let mut levels = 0;
        let mut passes = 0;

        if two_m > 0.0 {
            let mut level = Level::from_graph(graph);
            let mut current_q = modularity(graph, &membership, gamma);

            while levels < self.config.max_levels {
                let phase = self.local_phase(&level, two_m);
                levels += 1;
                passes += phase.passes;
                if !phase.moved {
                    break;
                }

                let (renumbered, count) = renumber(&phase.community);
                membership = membership.iter().map(|&s| renumbered[s]).collect();
                let q = modularity(graph, &membership, gamma);
                let gain = q - current_q;
                current_q = q;
                debug!(level = levels, communities = count, modularity = q, "louvain level");

                if gain < self.config.min_modularity_gain || count == level.len() {
                    break;
                }
                level = level.aggregate(&renumbered, count);
            }
        }

        let (membership, count) = renumber(&membership);
        self.summarize(graph, &membership, count, levels, passes)
    }

    fn local_phase(&self, level: &Level, two_m: f64) -> LocalPhase {
        let n = level.len();
        let gamma = self.config.resolution;
        let k: Vec<f64> = (0..n).map(|i| level.strength(i)).collect();
        let mut tot = k.clone();
        let mut community: Vec<usize> = (0..n).collect();
        let mut moved = false;
        let mut passes = 0;

        while passes < self.config.max_passes {
            passes += 1;
            let mut moved_this_pass = false;

            for i in 0..n {
                let current = community[i];
                let mut links: BTreeMap<usize, f64> = BTreeMap::new();
                for &(j, w) in &level.adjacency[i] {
                    *links.entry(community[j]).or_insert(0.0) += w;
                }

                tot[current] -= k[i];
                let gain = |c: usize, w_in: f64| w_in - gamma * tot[c] * k[i] / two_m;
                let stay = gain(current, links.get(&current).copied().unwrap_or(0.0));

                let mut best: Option<(usize, f64)> = None;
                for (&c, &w_in) in &links {
                    if c == current {
                        continue;
                    }
                    let g = gain(c, w_in);
                    if best.is_none_or(|(_, best_gain)| g > best_gain) {
                        best = Some((c, g));
                    }
                }

                let target = match best {
                    Some((c, g)) if g > stay + MOVE_EPSILON => c,
                    _ => current,
                };
                tot[target] += k[i];
                if target != current {
                    community[i] = target;
                    moved_this_pass = true;
                }
            }

            if !moved_this_pass {
                break;
            }
            moved = true;
        }

        LocalPhase {
            community,
            moved,
            passes,
        }
    }

    #[allow(clippy::unused_self)]
    fn summarize(
        &self,
        graph: &ConflictGraph,
        membership: &[usize],
        count: usize,
        levels: usize,
        passes: usize,
    ) -> CommunityStructure {
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); count];
        for (node, &c) in membership.iter().enumerate() {
            members[c].push(node);
        }
        let mut internal = vec![0.0; count];
        for (a, b, w) in graph.edges() {
            if membership[a] == membership[b] {
                internal[membership[a]] += w;
            }
        }

        let communities = members
            .iter()
            .enumerate()
            .map(|(id, nodes)| CommunitySummary {
                id,
                members: nodes.iter().map(|&i| graph.node_id(i).to_string()).collect(),
                size: nodes.len(),
                internal_weight: internal[id],
                dominant_domain: dominant_domain(graph, nodes),
            })
            .collect();

        CommunityStructure {
            assignments: membership
                .iter()
                .enumerate()
                .map(|(i, &c)| (graph.node_id(i).to_string(), c))
                .collect(),
            community_count: count,
            modularity: modularity(graph, membership, self.config.resolution),
            levels,
            passes,
            communities,
        }
    }
}

/// Modularity of `assignment` (node index to community id) on `graph`.
///
/// `Q = Σ_c [ 2·in_c / 2m − γ·(tot_c / 2m)² ]`; 0 for graphs without edges.
#[must_use]
pub fn modularity(graph: &ConflictGraph, assignment: &[usize], resolution: f64) -> f64 {
    let two_m = 2.0 * graph.total_weight();
    if two_m <= 0.0 {
        return 0.0;
    }
    let count = assignment.iter().copied().max().map_or(0, |m| m + 1);
    let mut internal = vec![0.0; count];
    let mut tot = vec![0.0; count];
    for (a, b, w) in graph.edges() {
        tot[assignment[a]] += w;
        tot[assignment[b]] += w;
        if assignment[a] == assignment[b] {
            internal[assignment[a]] += w;
        }
    }
    internal
        .iter()
        .zip(&tot)
        .map(|(&inside, &total)| 2.0 * inside / two_m - resolution * (total / two_m).powi(2))
        .sum()
}

/// Relabel communities `0..` in order of first appearance.
fn renumber(labels: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: BTreeMap<usize, usize> = BTreeMap::new();
    let out = labels
        .iter()
        .map(|&label| {
            let next = mapping.len();
            *mapping.entry(label).or_insert(next)
        })
        .collect();
    (out, mapping.len())
}

fn dominant_domain(graph: &ConflictGraph, nodes: &[usize]) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for &i in nodes {
        if let Some(domain) = graph.node(i).domain.as_deref() {
            *counts.entry(domain).or_insert(0) += 1;
        }
    }
    // BTreeMap order plus a strict comparison keeps the lexically first on ties.
    counts
        .into_iter()
        .fold(None::<(&str, usize)>, |best, (d, c)| match best {
            Some((_, bc)) if bc >= c => best,
            _ => Some((d, c)),
        })
        .map(|(d, _)| d.to_string())
}
