//! The aggregated analysis report.

use serde::Serialize;
use serde_json::Value;
use strife_core::Issue;
use tracing::error;

use crate::community::CommunityStructure;
use crate::graph::GraphSummary;
use crate::intensity::IntensityProfile;
use crate::metrics::CentralityScores;
use crate::propagation::PropagationModel;
use crate::robustness::RobustnessReport;
use crate::topology::TopologyMetrics;

/// Report section names, as used in `failures`.
pub mod section {
    pub const TOPOLOGY: &str = "topology";
    pub const INTENSITY: &str = "intensity";
    pub const COMMUNITIES: &str = "communities";
    pub const CENTRALITY: &str = "centrality";
    pub const PROPAGATION: &str = "propagation";
    pub const ROBUSTNESS: &str = "robustness";
}

/// A section replaced by its degenerate default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionFailure {
    pub section: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AnalysisReport {
    pub graph: GraphSummary,
    pub topology: TopologyMetrics,
    pub intensity: IntensityProfile,
    pub communities: CommunityStructure,
    pub centrality: CentralityScores,
    pub propagation: PropagationModel,
    pub robustness: RobustnessReport,
    pub issues: Vec<Issue>,
    pub failures: Vec<SectionFailure>,
}

impl AnalysisReport {
    /// Plain nested JSON value of the whole report.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|err| {
            error!(%err, "report serialization failed");
            Value::Null
        })
    }

    #[must_use]
    pub fn failed(&self, section: &str) -> bool {
        self.failures.iter().any(|f| f.section == section)
    }
}
