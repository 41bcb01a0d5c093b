//! Conflict diffusion as a discrete-time SI contagion.
//!
//! Each edge weight is the per-step probability that an infected entity
//! drags its neighbor into the conflict. Infected nodes never recover.
//!
//! Trials are independent and run in parallel; trial `t` draws from
//! `StdRng::seed_from_u64(seed + t)`, so results do not depend on thread
//! scheduling. Random removal in [`crate::robustness`] mixes its own stream
//! constant into its seed, so equal seeds in both sections draw different
//! numbers.

use fixedbitset::FixedBitSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use strife_core::config::PropagationConfig;
use tracing::{debug, instrument};

use crate::error::AnalysisError;
use crate::graph::ConflictGraph;

/// Aggregate outcome of one seeded diffusion experiment.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SpreadEstimate {
    pub seeds: Vec<String>,
    pub trials: usize,
    /// Mean over trials of infected / N at termination.
    pub expected_affected_fraction: f64,
    /// Mean infected count at termination.
    pub expected_affected: f64,
    /// Mean infected fraction after each step; index 0 is the seed set.
    pub curve: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedSetPoint {
    pub size: usize,
    pub seeds: Vec<String>,
    pub expected_affected_fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSpread {
    pub id: String,
    pub expected_affected_fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainScenario {
    pub domain: String,
    pub seed_count: usize,
    pub expected_affected_fraction: f64,
    pub curve: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PropagationModel {
    pub transmission_rate: f64,
    pub trials: usize,
    pub max_steps: usize,
    pub seed: u64,
    pub seed_set_curve: Vec<SeedSetPoint>,
    pub single_node_ranking: Vec<NodeSpread>,
    pub domain_scenarios: Vec<DomainScenario>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PropagationModeler {
    config: PropagationConfig,
}

impl PropagationModeler {
    #[must_use]
    pub const fn new(config: PropagationConfig) -> Self {
        Self { config }
    }

    /// Degree-weighted mean edge weight: each edge counts `deg(u) + deg(v)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::unused_self)]
    pub fn transmission_rate(&self, graph: &ConflictGraph) -> f64 {
        let (weighted, total) = graph.edges().fold((0.0, 0.0), |(num, den), (a, b, w)| {
            let k = (graph.degree(a) + graph.degree(b)) as f64;
            (num + k * w, den + k)
        });
        if total > 0.0 { weighted / total } else { 0.0 }
    }

    /// Diffusion from the given entity ids.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::UnknownNode`] if any id is not in the graph.
    pub fn simulate(&self, graph: &ConflictGraph, seeds: &[&str]) -> Result<SpreadEstimate, AnalysisError> {
        let mut indices = Vec::with_capacity(seeds.len());
        for &id in seeds {
            let index = graph
                .index_of(id)
                .ok_or_else(|| AnalysisError::UnknownNode { id: id.to_string() })?;
            indices.push(index);
        }
        Ok(self.simulate_indices(graph, &indices))
    }

    /// Diffusion seeded with every node in `domain`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::UnknownDomain`] if no node carries the domain.
    pub fn simulate_domain(&self, graph: &ConflictGraph, domain: &str) -> Result<SpreadEstimate, AnalysisError> {
        let seeds = graph.nodes_in_domain(domain);
        if seeds.is_empty() {
            return Err(AnalysisError::UnknownDomain {
                domain: domain.to_string(),
            });
        }
        Ok(self.simulate_indices(graph, &seeds))
    }

    /// Diffusion from node indices. Duplicate seeds count once.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn simulate_indices(&self, graph: &ConflictGraph, seeds: &[usize]) -> SpreadEstimate {
        let n = graph.node_count();
        let mut seed_ids: Vec<usize> = seeds.to_vec();
        seed_ids.sort_unstable();
        seed_ids.dedup();
        let seed_names = seed_ids.iter().map(|&i| graph.node_id(i).to_string()).collect();

        if n == 0 || self.config.trials == 0 {
            return SpreadEstimate {
                seeds: seed_names,
                ..SpreadEstimate::default()
            };
        }

        let runs: Vec<Vec<usize>> = (0..self.config.trials)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(t as u64));
                run_trial(graph, &seed_ids, self.config.max_steps, &mut rng)
            })
            .collect();

        let len = runs.iter().map(Vec::len).max().unwrap_or(1);
        let trials = runs.len() as f64;
        let mut curve = vec![0.0; len];
        for run in &runs {
            let last = run.last().copied().unwrap_or(0);
            for (step, slot) in curve.iter_mut().enumerate() {
                *slot += run.get(step).copied().unwrap_or(last) as f64;
            }
        }
        for slot in &mut curve {
            *slot /= trials * n as f64;
        }
        let expected_affected = runs
            .iter()
            .map(|r| r.last().copied().unwrap_or(0) as f64)
            .sum::<f64>()
            / trials;

        SpreadEstimate {
            seeds: seed_names,
            trials: runs.len(),
            expected_affected_fraction: expected_affected / n as f64,
            expected_affected,
            curve,
        }
    }

    /// Full propagation section: seed-set curve, single-node ranking, and
    /// one scenario per domain.
    #[must_use]
    #[instrument(skip_all, fields(nodes = graph.node_count(), trials = self.config.trials))]
    pub fn analyze(&self, graph: &ConflictGraph) -> PropagationModel {
        let ranked = graph.by_weighted_degree();

        let seed_set_curve = (1..=self.config.max_seed_set.min(ranked.len()))
            .map(|size| {
                let estimate = self.simulate_indices(graph, &ranked[..size]);
                SeedSetPoint {
                    size,
                    seeds: ranked[..size].iter().map(|&i| graph.node_id(i).to_string()).collect(),
                    expected_affected_fraction: estimate.expected_affected_fraction,
                }
            })
            .collect();

        let mut single_node_ranking: Vec<NodeSpread> = (0..graph.node_count())
            .map(|i| NodeSpread {
                id: graph.node_id(i).to_string(),
                expected_affected_fraction: self.simulate_indices(graph, &[i]).expected_affected_fraction,
            })
            .collect();
        single_node_ranking.sort_by(|a, b| {
            b.expected_affected_fraction
                .total_cmp(&a.expected_affected_fraction)
                .then_with(|| a.id.cmp(&b.id))
        });
        single_node_ranking.truncate(self.config.single_seed_limit);

        // Every listed domain has at least one node, so none can be unknown.
        let domain_scenarios: Vec<DomainScenario> = graph
            .domains()
            .into_iter()
            .map(|domain| {
                let estimate = self.simulate_indices(graph, &graph.nodes_in_domain(domain));
                DomainScenario {
                    domain: domain.to_string(),
                    seed_count: estimate.seeds.len(),
                    expected_affected_fraction: estimate.expected_affected_fraction,
                    curve: estimate.curve,
                }
            })
            .collect();

        let transmission_rate = self.transmission_rate(graph);
        debug!(transmission_rate, domains = domain_scenarios.len(), "propagation modeled");

        PropagationModel {
            transmission_rate,
            trials: self.config.trials,
            max_steps: self.config.max_steps,
            seed: self.config.seed,
            seed_set_curve,
            single_node_ranking,
            domain_scenarios,
        }
    }
}

/// One SI trial. Returns the infected count after each step (index 0 = seeds).
fn run_trial(graph: &ConflictGraph, seeds: &[usize], max_steps: usize, rng: &mut StdRng) -> Vec<usize> {
    let n = graph.node_count();
    let mut infected = FixedBitSet::with_capacity(n);
    for &s in seeds {
        infected.insert(s);
    }
    let mut count = infected.count_ones(..);
    let mut history = vec![count];
    let mut fresh = FixedBitSet::with_capacity(n);

    for _ in 0..max_steps {
        fresh.clear();
        for u in infected.ones() {
            for &(v, w) in graph.neighbors(u) {
                if infected.contains(v) || fresh.contains(v) {
                    continue;
                }
                if rng.gen_bool(w.clamp(0.0, 1.0)) {
                    fresh.insert(v);
                }
            }
        }
        let gained = fresh.count_ones(..);
        if gained == 0 {
            break;
        }
        infected.union_with(&fresh);
        count += gained;
        history.push(count);
    }
    history
}
