//! Per-node centrality metrics.
//!
//! Each metric answers a different question about an entity's position:
//!
//! - **Degree** (`degree`): how many direct opponents does it have?
//! - **Betweenness** (`betweenness`): does it bridge otherwise separate conflicts?
//! - **Closeness** (`degree::closeness_centrality`): how few hops to everyone else?
//! - **Eigenvector** (`eigenvector`): is it fighting other central entities?
//!
//! The metric functions return scores indexed by node; [`CentralityAnalyzer`]
//! combines them into id-keyed [`CentralityScores`] with stable rankings.

pub mod betweenness;
pub mod degree;
pub mod eigenvector;

use std::collections::BTreeMap;

use serde::Serialize;
use strife_core::CentralityMetric;
use strife_core::config::CentralityConfig;
use tracing::{instrument, warn};

use crate::error::AnalysisError;
use crate::graph::ConflictGraph;

pub use betweenness::betweenness_centrality;
pub use degree::{closeness_centrality, degree_centrality};
pub use eigenvector::{EigenvectorResult, eigenvector_centrality};

/// All four scores for one node, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NodeCentrality {
    pub degree: f64,
    pub betweenness: f64,
    pub closeness: f64,
    pub eigenvector: f64,
}

impl NodeCentrality {
    #[must_use]
    pub const fn get(&self, metric: CentralityMetric) -> f64 {
        match metric {
            CentralityMetric::Degree => self.degree,
            CentralityMetric::Betweenness => self.betweenness,
            CentralityMetric::Closeness => self.closeness,
            CentralityMetric::Eigenvector => self.eigenvector,
        }
    }
}

/// How the eigenvector scores were obtained.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EigenvectorStatus {
    pub converged: bool,
    pub iterations: usize,
    /// True when eigenvector scores were replaced by degree centrality.
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedNode {
    pub id: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CentralityScores {
    pub nodes: BTreeMap<String, NodeCentrality>,
    pub eigenvector: EigenvectorStatus,
    /// Top entries per metric name.
    pub top: BTreeMap<String, Vec<RankedNode>>,
}

impl CentralityScores {
    /// Every node ranked by `metric`: score descending, ties by id ascending.
    #[must_use]
    pub fn ranking(&self, metric: CentralityMetric) -> Vec<RankedNode> {
        let mut ranked: Vec<RankedNode> = self
            .nodes
            .iter()
            .map(|(id, c)| RankedNode {
                id: id.clone(),
                score: c.get(metric),
            })
            .collect();
        // Stable sort over id-ordered input keeps ties in id order.
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CentralityAnalyzer {
    config: CentralityConfig,
}

impl CentralityAnalyzer {
    #[must_use]
    pub const fn new(config: CentralityConfig) -> Self {
        Self { config }
    }

    #[must_use]
    #[instrument(skip_all, fields(nodes = graph.node_count()))]
    pub fn analyze(&self, graph: &ConflictGraph) -> CentralityScores {
        let degree = degree_centrality(graph);
        let betweenness = betweenness_centrality(graph);
        let closeness = closeness_centrality(graph);

        let (eigenvector, status) = match eigenvector_centrality(
            graph,
            self.config.eigenvector_max_iter,
            self.config.eigenvector_tolerance,
        ) {
            Ok(result) => (
                result.scores,
                EigenvectorStatus {
                    converged: true,
                    iterations: result.iterations,
                    fallback: false,
                    error: None,
                },
            ),
            Err(err @ AnalysisError::NonConvergence { iterations, .. }) => {
                warn!(%err, "eigenvector centrality fell back to degree");
                (
                    degree.clone(),
                    EigenvectorStatus {
                        converged: false,
                        iterations,
                        fallback: true,
                        error: Some(err.to_string()),
                    },
                )
            }
            Err(err) => {
                warn!(%err, "eigenvector centrality fell back to degree");
                (
                    degree.clone(),
                    EigenvectorStatus {
                        converged: false,
                        iterations: 0,
                        fallback: true,
                        error: Some(err.to_string()),
                    },
                )
            }
        };

        let nodes: BTreeMap<String, NodeCentrality> = (0..graph.node_count())
            .map(|i| {
                (
                    graph.node_id(i).to_string(),
                    NodeCentrality {
                        degree: degree[i],
                        betweenness: betweenness[i],
                        closeness: closeness[i],
                        eigenvector: eigenvector[i],
                    },
                )
            })
            .collect();

        let mut scores = CentralityScores {
            nodes,
            eigenvector: status,
            top: BTreeMap::new(),
        };
        for metric in CentralityMetric::ALL {
            let mut ranked = scores.ranking(metric);
            ranked.truncate(self.config.top_k);
            scores.top.insert(metric.as_str().to_string(), ranked);
        }
        scores
    }
}
