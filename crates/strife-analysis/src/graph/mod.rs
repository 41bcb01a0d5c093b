//! The conflict graph and its construction.
//!
//! [`ConflictGraph`] wraps a petgraph [`UnGraph`] whose node indices follow
//! ascending entity id order. Every analyzer addresses nodes by that dense
//! index, so "ascending node order" and "ascending id order" are the same
//! thing throughout the crate.

#![allow(clippy::module_name_repetitions)]

pub mod build;

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use fixedbitset::FixedBitSet;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::Serialize;
use strife_core::{AggregationPolicy, EntityKind};

pub use build::{BuiltGraph, GraphBuilder};

/// Label used for entities without a domain in domain-keyed output.
pub const UNASSIGNED_DOMAIN: &str = "unassigned";

/// Entity attributes carried on a graph node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityNode {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
    pub domain: Option<String>,
}

/// Size and identity of a built graph, echoed at the top of every report.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct GraphSummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub content_hash: String,
    pub aggregation: AggregationPolicy,
}

// ---------------------------------------------------------------------------
// ConflictGraph
// ---------------------------------------------------------------------------

/// Immutable weighted undirected conflict graph.
#[derive(Debug, Clone)]
pub struct ConflictGraph {
    graph: UnGraph<EntityNode, f64>,
    index: HashMap<String, usize>,
    /// Neighbor lists sorted by neighbor index.
    adjacency: Vec<Vec<(usize, f64)>>,
    policy: AggregationPolicy,
    content_hash: String,
}

impl ConflictGraph {
    /// Assemble a graph from nodes sorted by id and edges `(a, b, w)` with
    /// `a < b`, sorted. Only the builder calls this.
    pub(crate) fn from_sorted(
        nodes: Vec<EntityNode>,
        edges: &[(usize, usize, f64)],
        policy: AggregationPolicy,
    ) -> Self {
        let mut graph = UnGraph::with_capacity(nodes.len(), edges.len());
        let mut index = HashMap::with_capacity(nodes.len());
        for node in nodes {
            let id = node.id.clone();
            let idx = graph.add_node(node);
            index.insert(id, idx.index());
        }

        let mut adjacency = vec![Vec::new(); graph.node_count()];
        for &(a, b, weight) in edges {
            graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), weight);
            adjacency[a].push((b, weight));
            adjacency[b].push((a, weight));
        }
        for neighbors in &mut adjacency {
            neighbors.sort_by_key(|&(n, _)| n);
        }

        let content_hash = compute_content_hash(&graph, edges);

        Self {
            graph,
            index,
            adjacency,
            policy,
            content_hash,
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// The underlying petgraph store.
    #[must_use]
    pub const fn inner(&self) -> &UnGraph<EntityNode, f64> {
        &self.graph
    }

    #[must_use]
    pub fn node(&self, index: usize) -> &EntityNode {
        &self.graph[NodeIndex::new(index)]
    }

    #[must_use]
    pub fn node_id(&self, index: usize) -> &str {
        &self.node(index).id
    }

    /// Dense index of an entity id, if it survived construction.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Neighbors of `index` with edge weights, ascending by neighbor index.
    #[must_use]
    pub fn neighbors(&self, index: usize) -> &[(usize, f64)] {
        &self.adjacency[index]
    }

    #[must_use]
    pub fn degree(&self, index: usize) -> usize {
        self.adjacency[index].len()
    }

    /// Sum of incident edge weights.
    #[must_use]
    pub fn weighted_degree(&self, index: usize) -> f64 {
        self.adjacency[index].iter().map(|&(_, w)| w).sum()
    }

    /// Every edge once as `(a, b, weight)` with `a < b`, in ascending order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(a, neighbors)| {
            neighbors
                .iter()
                .filter(move |&&(b, _)| a < b)
                .map(move |&(b, w)| (a, b, w))
        })
    }

    /// Sum of all edge weights (each edge once).
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.edges().map(|(_, _, w)| w).sum()
    }

    #[must_use]
    pub const fn policy(&self) -> AggregationPolicy {
        self.policy
    }

    /// BLAKE3 hash of the sorted node and edge set.
    #[must_use]
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Domain label of a node, `"unassigned"` when absent.
    #[must_use]
    pub fn domain_label(&self, index: usize) -> &str {
        self.node(index).domain.as_deref().unwrap_or(UNASSIGNED_DOMAIN)
    }

    /// Distinct assigned domains, sorted.
    #[must_use]
    pub fn domains(&self) -> BTreeSet<&str> {
        self.graph
            .node_weights()
            .filter_map(|n| n.domain.as_deref())
            .collect()
    }

    /// Indices of every node assigned to `domain`, ascending.
    #[must_use]
    pub fn nodes_in_domain(&self, domain: &str) -> Vec<usize> {
        (0..self.node_count())
            .filter(|&i| self.node(i).domain.as_deref() == Some(domain))
            .collect()
    }

    /// Connected components, each sorted ascending, ordered by lowest member.
    #[must_use]
    pub fn connected_components(&self) -> Vec<Vec<usize>> {
        let n = self.node_count();
        let mut seen = FixedBitSet::with_capacity(n);
        let mut components = Vec::new();
        let mut queue = VecDeque::new();

        for start in 0..n {
            if seen.contains(start) {
                continue;
            }
            seen.insert(start);
            queue.push_back(start);
            let mut members = Vec::new();
            while let Some(u) = queue.pop_front() {
                members.push(u);
                for &(v, _) in self.neighbors(u) {
                    if !seen.contains(v) {
                        seen.insert(v);
                        queue.push_back(v);
                    }
                }
            }
            members.sort_unstable();
            components.push(members);
        }
        components
    }

    /// Hop distances from `source`; `None` for unreachable nodes.
    #[must_use]
    pub fn bfs_distances(&self, source: usize) -> Vec<Option<usize>> {
        let mut dist = vec![None; self.node_count()];
        let mut queue = VecDeque::new();
        dist[source] = Some(0);
        queue.push_back(source);
        while let Some(u) = queue.pop_front() {
            let du = dist[u].unwrap_or(0);
            for &(v, _) in self.neighbors(u) {
                if dist[v].is_none() {
                    dist[v] = Some(du + 1);
                    queue.push_back(v);
                }
            }
        }
        dist
    }

    /// Node indices sorted by weighted degree descending, ties by id.
    #[must_use]
    pub fn by_weighted_degree(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.node_count()).collect();
        let strength: Vec<f64> = order.iter().map(|&i| self.weighted_degree(i)).collect();
        order.sort_by(|&a, &b| strength[b].total_cmp(&strength[a]).then(a.cmp(&b)));
        order
    }

    /// Per-domain node counts, keyed by domain label.
    #[must_use]
    pub fn domain_sizes(&self) -> BTreeMap<String, usize> {
        let mut sizes = BTreeMap::new();
        for i in 0..self.node_count() {
            *sizes.entry(self.domain_label(i).to_string()).or_insert(0) += 1;
        }
        sizes
    }

    #[must_use]
    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            content_hash: self.content_hash.clone(),
            aggregation: self.policy,
        }
    }
}

fn compute_content_hash(graph: &UnGraph<EntityNode, f64>, edges: &[(usize, usize, f64)]) -> String {
    let mut hasher = blake3::Hasher::new();
    for node in graph.node_weights() {
        hasher.update(b"n\0");
        hasher.update(node.id.as_bytes());
        hasher.update(b"\0");
    }
    for &(a, b, weight) in edges {
        hasher.update(b"e\0");
        hasher.update(graph[NodeIndex::new(a)].id.as_bytes());
        hasher.update(b"\0");
        hasher.update(graph[NodeIndex::new(b)].id.as_bytes());
        hasher.update(b"\0");
        hasher.update(&weight.to_bits().to_le_bytes());
    }
    format!("blake3:{}", hasher.finalize().to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strife_core::{EntityRecord, RelationRecord};

    fn graph(ids: &[&str], edges: &[(&str, &str, f64)]) -> ConflictGraph {
        let entities: Vec<_> = ids
            .iter()
            .map(|id| EntityRecord::new(*id, *id, EntityKind::Character))
            .collect();
        let relations: Vec<_> = edges
            .iter()
            .map(|(a, b, w)| RelationRecord::new(*a, *b, *w))
            .collect();
        GraphBuilder::new(AggregationPolicy::SumClamped)
            .build(&entities, &relations)
            .graph
    }

    #[test]
    fn nodes_follow_id_order() {
        let g = graph(&["c", "a", "b"], &[]);
        assert_eq!(g.node_id(0), "a");
        assert_eq!(g.node_id(2), "c");
        assert_eq!(g.index_of("b"), Some(1));
    }

    #[test]
    fn neighbors_sorted_and_symmetric() {
        let g = graph(&["a", "b", "c"], &[("c", "a", 0.5), ("a", "b", 0.25)]);
        assert_eq!(g.neighbors(0), &[(1, 0.25), (2, 0.5)]);
        assert_eq!(g.neighbors(2), &[(0, 0.5)]);
        let edges: Vec<_> = g.edges().collect();
        assert_eq!(edges, vec![(0, 1, 0.25), (0, 2, 0.5)]);
    }

    #[test]
    fn components_ordered_by_lowest_member() {
        let g = graph(&["a", "b", "c", "d"], &[("b", "d", 1.0)]);
        assert_eq!(g.connected_components(), vec![vec![0], vec![1, 3], vec![2]]);
    }

    #[test]
    fn hash_has_prefix_and_tracks_weights() {
        let g1 = graph(&["a", "b"], &[("a", "b", 0.5)]);
        let g2 = graph(&["a", "b"], &[("a", "b", 0.6)]);
        assert!(g1.content_hash().starts_with("blake3:"));
        assert_ne!(g1.content_hash(), g2.content_hash());
    }

    #[test]
    fn bfs_marks_unreachable() {
        let g = graph(&["a", "b", "c"], &[("a", "b", 1.0)]);
        assert_eq!(g.bfs_distances(0), vec![Some(0), Some(1), None]);
    }
}
