//! Distribution of conflict intensity over edges.

use std::collections::BTreeMap;

use serde::Serialize;
use strife_core::config::{IntensityBands, IntensityConfig};
use tracing::{debug, instrument};

use crate::graph::ConflictGraph;
use crate::stats::{mean, percentile, std_dev};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl IntensityLevel {
    #[must_use]
    pub fn classify(weight: f64, bands: &IntensityBands) -> Self {
        if weight >= bands.critical {
            Self::Critical
        } else if weight >= bands.high {
            Self::High
        } else if weight >= bands.medium {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LevelCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

impl LevelCounts {
    const fn record(&mut self, level: IntensityLevel) {
        match level {
            IntensityLevel::Low => self.low += 1,
            IntensityLevel::Medium => self.medium += 1,
            IntensityLevel::High => self.high += 1,
            IntensityLevel::Critical => self.critical += 1,
        }
    }
}

/// An edge at or above the high-risk threshold. `source < target` by id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighRiskPair {
    pub source: String,
    pub target: String,
    pub weight: f64,
    pub level: IntensityLevel,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct IntensityProfile {
    pub edge_count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub levels: LevelCounts,
    pub high_risk_threshold: f64,
    pub high_risk_pairs: Vec<HighRiskPair>,
    /// Mean weight per `"{domain_a}<->{domain_b}"` pair.
    pub domain_pairs: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntensityModeler {
    config: IntensityConfig,
}

impl IntensityModeler {
    #[must_use]
    pub const fn new(config: IntensityConfig) -> Self {
        Self { config }
    }

    #[must_use]
    #[instrument(skip_all, fields(edges = graph.edge_count()))]
    pub fn analyze(&self, graph: &ConflictGraph) -> IntensityProfile {
        let edges: Vec<(usize, usize, f64)> = graph.edges().collect();
        if edges.is_empty() {
            return IntensityProfile::default();
        }

        let mut weights: Vec<f64> = edges.iter().map(|&(_, _, w)| w).collect();
        weights.sort_by(f64::total_cmp);

        let mut levels = LevelCounts::default();
        let mut domain_sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        for &(a, b, w) in &edges {
            levels.record(IntensityLevel::classify(w, &self.config.bands));
            let slot = domain_sums.entry(domain_pair_key(graph, a, b)).or_default();
            slot.0 += w;
            slot.1 += 1;
        }

        let threshold = percentile(&weights, self.config.high_risk_percentile);
        let mut high_risk_pairs: Vec<HighRiskPair> = edges
            .iter()
            .filter(|&&(_, _, w)| w >= threshold)
            .map(|&(a, b, w)| HighRiskPair {
                source: graph.node_id(a).to_string(),
                target: graph.node_id(b).to_string(),
                weight: w,
                level: IntensityLevel::classify(w, &self.config.bands),
            })
            .collect();
        high_risk_pairs.sort_by(|x, y| {
            y.weight
                .total_cmp(&x.weight)
                .then_with(|| pair_key(x).cmp(&pair_key(y)))
        });
        debug!(threshold, pairs = high_risk_pairs.len(), "high-risk pairs flagged");

        #[allow(clippy::cast_precision_loss)]
        let domain_pairs = domain_sums
            .into_iter()
            .map(|(key, (sum, count))| (key, sum / count as f64))
            .collect();

        IntensityProfile {
            edge_count: edges.len(),
            mean: mean(&weights),
            std_dev: std_dev(&weights),
            min: weights[0],
            max: weights[weights.len() - 1],
            median: percentile(&weights, 50.0),
            levels,
            high_risk_threshold: threshold,
            high_risk_pairs,
            domain_pairs,
        }
    }
}

fn pair_key(pair: &HighRiskPair) -> String {
    format!("{}|{}", pair.source, pair.target)
}

fn domain_pair_key(graph: &ConflictGraph, a: usize, b: usize) -> String {
    let (x, y) = (graph.domain_label(a), graph.domain_label(b));
    if x <= y {
        format!("{x}<->{y}")
    } else {
        format!("{y}<->{x}")
    }
}
