#![forbid(unsafe_code)]
//! strife-analysis: conflict graph construction and analytics.
//!
//! Data flows one way: [`GraphBuilder`] turns loaded records into an
//! immutable [`ConflictGraph`], each analyzer reads that snapshot, and
//! [`AnalysisEngine`] assembles the results into one [`AnalysisReport`].
//!
//! # Conventions
//!
//! - **Node order**: node indices follow ascending entity id; every
//!   tie-break in this crate resolves to the lower index.
//! - **Errors**: analyzer failures are [`AnalysisError`]s; the engine turns
//!   them into report `failures` instead of aborting.
//! - **Randomness**: only through `StdRng::seed_from_u64`, so runs repeat.
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod community;
pub mod engine;
pub mod error;
pub mod graph;
pub mod intensity;
pub mod metrics;
pub mod propagation;
pub mod report;
pub mod robustness;
pub mod stats;
pub mod topology;

pub use community::{CommunityDetector, CommunityStructure};
pub use engine::AnalysisEngine;
pub use error::AnalysisError;
pub use graph::{BuiltGraph, ConflictGraph, GraphBuilder};
pub use intensity::{IntensityModeler, IntensityProfile};
pub use metrics::{CentralityAnalyzer, CentralityScores};
pub use propagation::{PropagationModel, PropagationModeler};
pub use report::AnalysisReport;
pub use robustness::{RobustnessAnalyzer, RobustnessReport};
pub use topology::{TopologyAnalyzer, TopologyMetrics};
