//! The analysis orchestrator.
//!
//! [`AnalysisEngine`] builds the graph once and runs every analyzer against
//! the same immutable snapshot. Analyzers run as tasks on a rayon scope,
//! each writing its own pre-allocated slot; centrality and robustness share
//! one task because robustness targets nodes by centrality rank.
//!
//! A failing analyzer (error or panic) only costs its own section: the
//! section gets its degenerate default and a [`SectionFailure`] entry.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use strife_core::{AnalysisConfig, LoadError, LoadedRecords, RecordLoader};
use tracing::{error, info, instrument, warn};

use crate::community::CommunityDetector;
use crate::error::AnalysisError;
use crate::graph::{BuiltGraph, ConflictGraph, GraphBuilder};
use crate::intensity::IntensityModeler;
use crate::metrics::{CentralityAnalyzer, CentralityScores};
use crate::propagation::PropagationModeler;
use crate::report::{AnalysisReport, SectionFailure, section};
use crate::robustness::{RobustnessAnalyzer, RobustnessReport};
use crate::topology::TopologyAnalyzer;

#[derive(Debug, Clone, Default)]
pub struct AnalysisEngine {
    config: AnalysisConfig,
}

impl AnalysisEngine {
    #[must_use]
    pub const fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    #[must_use]
    pub fn loader(&self) -> RecordLoader {
        RecordLoader::new(&self.config.loader)
    }

    /// Build the graph with the configured aggregation policy.
    #[must_use]
    pub fn build_graph(&self, records: &LoadedRecords) -> BuiltGraph {
        GraphBuilder::new(self.config.graph.aggregation).build(&records.entities, &records.relations)
    }

    /// Load `path` and analyze it. Only loader failures abort.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the input cannot be located, read, or parsed.
    pub fn run_from_path(&self, path: &Path) -> Result<AnalysisReport, LoadError> {
        let records = self.loader().load_path(path)?;
        Ok(self.run_comprehensive_analysis(&records))
    }

    /// Build the graph and run every analyzer over it.
    #[must_use]
    #[instrument(skip_all, fields(entities = records.entities.len(), relations = records.relations.len()))]
    pub fn run_comprehensive_analysis(&self, records: &LoadedRecords) -> AnalysisReport {
        let BuiltGraph { graph, issues } = self.build_graph(records);
        let mut all_issues = records.issues.clone();
        all_issues.extend(issues);

        let mut report = match self.config.engine.worker_threads {
            Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(|| self.analyze_graph(&graph)),
                Err(err) => {
                    warn!(%err, threads, "worker pool unavailable; using the global pool");
                    self.analyze_graph(&graph)
                }
            },
            None => self.analyze_graph(&graph),
        };
        report.issues = all_issues;

        info!(
            nodes = report.graph.node_count,
            edges = report.graph.edge_count,
            issues = report.issues.len(),
            failures = report.failures.len(),
            "analysis complete"
        );
        report
    }

    /// Run every analyzer over an already-built graph. `issues` is left empty.
    #[must_use]
    pub fn analyze_graph(&self, graph: &ConflictGraph) -> AnalysisReport {
        let config = &self.config;
        let topology = || {
            run_stage(section::TOPOLOGY, || Ok(TopologyAnalyzer::new().analyze(graph)))
        };
        let intensity = || {
            run_stage(section::INTENSITY, || {
                Ok(IntensityModeler::new(config.intensity).analyze(graph))
            })
        };
        let communities = || {
            run_stage(section::COMMUNITIES, || {
                Ok(CommunityDetector::new(config.community).detect(graph))
            })
        };
        let propagation = || {
            run_stage(section::PROPAGATION, || {
                Ok(PropagationModeler::new(config.propagation).analyze(graph))
            })
        };
        let centrality_then_robustness = || {
            let centrality = run_stage(section::CENTRALITY, || {
                Ok(CentralityAnalyzer::new(config.centrality).analyze(graph))
            });
            let robustness = run_stage(section::ROBUSTNESS, || {
                Ok(RobustnessAnalyzer::new(config.robustness).analyze(graph, &centrality.0))
            });
            (centrality, robustness)
        };

        let mut topology_slot = None;
        let mut intensity_slot = None;
        let mut communities_slot = None;
        let mut propagation_slot = None;
        let mut chain_slot: Option<(Settled<CentralityScores>, Settled<RobustnessReport>)> = None;

        if config.engine.parallel {
            rayon::scope(|s| {
                s.spawn(|_| topology_slot = Some(topology()));
                s.spawn(|_| intensity_slot = Some(intensity()));
                s.spawn(|_| communities_slot = Some(communities()));
                s.spawn(|_| propagation_slot = Some(propagation()));
                s.spawn(|_| chain_slot = Some(centrality_then_robustness()));
            });
        } else {
            topology_slot = Some(topology());
            intensity_slot = Some(intensity());
            communities_slot = Some(communities());
            chain_slot = Some(centrality_then_robustness());
            propagation_slot = Some(propagation());
        }

        // Section order here fixes the order of `failures`.
        let mut failures = Vec::new();
        let topology = settle(topology_slot, &mut failures);
        let intensity = settle(intensity_slot, &mut failures);
        let communities = settle(communities_slot, &mut failures);
        let (centrality_slot, robustness_slot) = chain_slot.unzip();
        let centrality = settle(centrality_slot, &mut failures);
        let propagation = settle(propagation_slot, &mut failures);
        let robustness = settle(robustness_slot, &mut failures);

        AnalysisReport {
            graph: graph.summary(),
            topology,
            intensity,
            communities,
            centrality,
            propagation,
            robustness,
            issues: Vec::new(),
            failures,
        }
    }
}

/// A section value plus the failure that produced it, if any.
pub type Settled<T> = (T, Option<SectionFailure>);

fn settle<T: Default>(slot: Option<Settled<T>>, failures: &mut Vec<SectionFailure>) -> T {
    let (value, failure) = slot.unwrap_or_default();
    failures.extend(failure);
    value
}

/// Run one report section, converting an error or panic into its default
/// value plus a [`SectionFailure`].
pub fn run_stage<T, F>(name: &'static str, stage: F) -> Settled<T>
where
    T: Default,
    F: FnOnce() -> Result<T, AnalysisError>,
{
    let outcome = catch_unwind(AssertUnwindSafe(stage)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Err(AnalysisError::Panicked {
            section: name,
            message,
        })
    });

    match outcome {
        Ok(value) => (value, None),
        Err(err) => {
            error!(section = name, code = %err.code(), %err, "section failed; using default");
            (
                T::default(),
                Some(SectionFailure {
                    section: name.to_string(),
                    message: err.to_string(),
                }),
            )
        }
    }
}
