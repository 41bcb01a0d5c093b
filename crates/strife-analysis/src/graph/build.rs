//! Graph construction from loaded records.
//!
//! Entities are deduplicated by id (the last definition wins) and inserted
//! in ascending id order. Relations are grouped by unordered pair and their
//! strengths collapsed with the run's [`AggregationPolicy`]. Relations that
//! point at a missing entity or at their own source are dropped with an
//! [`Issue`]; nothing here is fatal.

use std::collections::BTreeMap;

use strife_core::{AggregationPolicy, EntityRecord, Issue, IssueKind, RelationRecord};
use tracing::{debug, info, instrument};

use super::{ConflictGraph, EntityNode};

/// A built graph together with the issues raised while building it.
#[derive(Debug, Clone)]
pub struct BuiltGraph {
    pub graph: ConflictGraph,
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GraphBuilder {
    policy: AggregationPolicy,
}

impl GraphBuilder {
    #[must_use]
    pub const fn new(policy: AggregationPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    #[instrument(skip_all, fields(policy = self.policy.as_str()))]
    pub fn build(&self, entities: &[EntityRecord], relations: &[RelationRecord]) -> BuiltGraph {
        let mut issues = Vec::new();

        let mut nodes: BTreeMap<&str, EntityNode> = BTreeMap::new();
        for entity in entities {
            let node = EntityNode {
                id: entity.id.clone(),
                name: entity.name.clone(),
                kind: entity.kind.clone(),
                domain: entity.domain.clone(),
            };
            if nodes.insert(entity.id.as_str(), node).is_some() {
                issues.push(Issue::build(
                    IssueKind::DuplicateEntity,
                    format!("entity `{}` defined more than once; last definition kept", entity.id),
                    serde_json::to_value(entity).ok(),
                ));
            }
        }

        let position: BTreeMap<&str, usize> =
            nodes.keys().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut pairs: BTreeMap<(usize, usize), Vec<f64>> = BTreeMap::new();
        for relation in relations {
            let source = position.get(relation.source_id.as_str());
            let target = position.get(relation.target_id.as_str());
            let (Some(&a), Some(&b)) = (source, target) else {
                let missing = if source.is_none() {
                    &relation.source_id
                } else {
                    &relation.target_id
                };
                issues.push(Issue::build(
                    IssueKind::DanglingReference,
                    format!(
                        "relation `{}` -> `{}` references unknown entity `{missing}`; dropped",
                        relation.source_id, relation.target_id
                    ),
                    serde_json::to_value(relation).ok(),
                ));
                continue;
            };
            if a == b {
                issues.push(Issue::build(
                    IssueKind::SelfLoop,
                    format!("relation on `{}` points at itself; dropped", relation.source_id),
                    serde_json::to_value(relation).ok(),
                ));
                continue;
            }
            pairs.entry((a.min(b), a.max(b))).or_default().push(relation.strength);
        }

        let edges: Vec<(usize, usize, f64)> = pairs
            .into_iter()
            .map(|((a, b), strengths)| {
                if strengths.len() > 1 {
                    debug!(a, b, count = strengths.len(), "aggregating parallel relations");
                }
                (a, b, self.policy.aggregate(&strengths))
            })
            .collect();

        let graph = ConflictGraph::from_sorted(nodes.into_values().collect(), &edges, self.policy);
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            issues = issues.len(),
            hash = graph.content_hash(),
            "graph built"
        );

        BuiltGraph { graph, issues }
    }
}
