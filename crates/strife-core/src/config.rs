//! Analysis configuration.
//!
//! One [`AnalysisConfig`] is built per run (defaults, or a TOML file) and
//! passed explicitly into the engine. Every section is optional in the file;
//! missing keys fall back to the defaults documented on each field.

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub intensity: IntensityConfig,
    #[serde(default)]
    pub community: CommunityConfig,
    #[serde(default)]
    pub centrality: CentralityConfig,
    #[serde(default)]
    pub propagation: PropagationConfig,
    #[serde(default)]
    pub robustness: RobustnessConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl AnalysisConfig {
    /// Parse a TOML document and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a value is out of range.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse analysis config")?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        let bands = &self.intensity.bands;
        ensure!(
            0.0 < bands.medium && bands.medium < bands.high && bands.high < bands.critical && bands.critical <= 1.0,
            "intensity bands must satisfy 0 < medium < high < critical <= 1 (got {}/{}/{})",
            bands.medium,
            bands.high,
            bands.critical
        );
        ensure!(
            (0.0..=100.0).contains(&self.intensity.high_risk_percentile),
            "intensity.high_risk_percentile must be within [0, 100]"
        );
        ensure!(self.community.max_passes > 0, "community.max_passes must be positive");
        ensure!(self.community.max_levels > 0, "community.max_levels must be positive");
        ensure!(self.community.resolution > 0.0, "community.resolution must be positive");
        ensure!(
            self.centrality.eigenvector_max_iter > 0,
            "centrality.eigenvector_max_iter must be positive"
        );
        ensure!(
            self.centrality.eigenvector_tolerance > 0.0,
            "centrality.eigenvector_tolerance must be positive"
        );
        ensure!(self.propagation.trials > 0, "propagation.trials must be positive");
        ensure!(self.propagation.max_steps > 0, "propagation.max_steps must be positive");
        ensure!(self.robustness.random_trials > 0, "robustness.random_trials must be positive");
        if let Some(threads) = self.engine.worker_threads {
            ensure!(threads > 0, "engine.worker_threads must be positive when set");
        }
        Ok(())
    }
}

/// Load and validate a TOML config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or validated.
pub fn load_config(path: &Path) -> Result<AnalysisConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    AnalysisConfig::from_toml_str(&content)
        .with_context(|| format!("Failed to load {}", path.display()))
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Accepted narrative domains. Empty accepts any domain label.
    #[serde(default)]
    pub domains: Vec<String>,
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// Rule for collapsing several relation strengths on one unordered pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationPolicy {
    /// Sum of strengths, clamped to `[0, 1]`.
    #[default]
    SumClamped,
    /// Arithmetic mean of strengths.
    Mean,
    /// Largest single strength.
    Max,
}

impl AggregationPolicy {
    /// Aggregate a non-empty list of strengths. Returns 0.0 for an empty slice.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn aggregate(self, strengths: &[f64]) -> f64 {
        if strengths.is_empty() {
            return 0.0;
        }
        match self {
            Self::SumClamped => strengths.iter().sum::<f64>().clamp(0.0, 1.0),
            Self::Mean => strengths.iter().sum::<f64>() / strengths.len() as f64,
            Self::Max => strengths.iter().copied().fold(0.0_f64, f64::max),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SumClamped => "sum_clamped",
            Self::Mean => "mean",
            Self::Max => "max",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub aggregation: AggregationPolicy,
}

// ---------------------------------------------------------------------------
// Intensity
// ---------------------------------------------------------------------------

/// Lower bounds of the medium/high/critical intensity levels; `low` is everything below `medium`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensityBands {
    #[serde(default = "default_band_medium")]
    pub medium: f64,
    #[serde(default = "default_band_high")]
    pub high: f64,
    #[serde(default = "default_band_critical")]
    pub critical: f64,
}

impl Default for IntensityBands {
    fn default() -> Self {
        Self {
            medium: default_band_medium(),
            high: default_band_high(),
            critical: default_band_critical(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensityConfig {
    #[serde(default)]
    pub bands: IntensityBands,
    /// Percentile of edge weights at or above which a pair is high-risk.
    #[serde(default = "default_high_risk_percentile")]
    pub high_risk_percentile: f64,
}

impl Default for IntensityConfig {
    fn default() -> Self {
        Self {
            bands: IntensityBands::default(),
            high_risk_percentile: default_high_risk_percentile(),
        }
    }
}

// ---------------------------------------------------------------------------
// Community
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommunityConfig {
    /// Local-move passes per level.
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,
    /// Aggregation levels.
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,
    #[serde(default = "default_resolution")]
    pub resolution: f64,
    /// Stop aggregating once modularity improves by less than this.
    #[serde(default = "default_min_modularity_gain")]
    pub min_modularity_gain: f64,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            max_passes: default_max_passes(),
            max_levels: default_max_levels(),
            resolution: default_resolution(),
            min_modularity_gain: default_min_modularity_gain(),
        }
    }
}

// ---------------------------------------------------------------------------
// Centrality
// ---------------------------------------------------------------------------

/// Which centrality score to rank by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CentralityMetric {
    Degree,
    #[default]
    Betweenness,
    Closeness,
    Eigenvector,
}

impl CentralityMetric {
    pub const ALL: [Self; 4] = [
        Self::Degree,
        Self::Betweenness,
        Self::Closeness,
        Self::Eigenvector,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Degree => "degree",
            Self::Betweenness => "betweenness",
            Self::Closeness => "closeness",
            Self::Eigenvector => "eigenvector",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CentralityConfig {
    #[serde(default = "default_eigenvector_max_iter")]
    pub eigenvector_max_iter: usize,
    /// L2 change between iterations below which power iteration stops.
    #[serde(default = "default_eigenvector_tolerance")]
    pub eigenvector_tolerance: f64,
    /// Ranked entries reported per metric.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for CentralityConfig {
    fn default() -> Self {
        Self {
            eigenvector_max_iter: default_eigenvector_max_iter(),
            eigenvector_tolerance: default_eigenvector_tolerance(),
            top_k: default_top_k(),
        }
    }
}

// ---------------------------------------------------------------------------
// Propagation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationConfig {
    #[serde(default = "default_trials")]
    pub trials: usize,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default = "default_propagation_seed")]
    pub seed: u64,
    /// Largest seed set on the seed-set curve.
    #[serde(default = "default_max_seed_set")]
    pub max_seed_set: usize,
    /// Nodes reported in the single-seed spread ranking.
    #[serde(default = "default_single_seed_limit")]
    pub single_seed_limit: usize,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            trials: default_trials(),
            max_steps: default_max_steps(),
            seed: default_propagation_seed(),
            max_seed_set: default_max_seed_set(),
            single_seed_limit: default_single_seed_limit(),
        }
    }
}

// ---------------------------------------------------------------------------
// Robustness
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobustnessConfig {
    /// Ranking used for the targeted removal order.
    #[serde(default)]
    pub targeted_metric: CentralityMetric,
    #[serde(default = "default_random_trials")]
    pub random_trials: usize,
    #[serde(default = "default_robustness_seed")]
    pub seed: u64,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            targeted_metric: CentralityMetric::default(),
            random_trials: default_random_trials(),
            seed: default_robustness_seed(),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Run analyzers concurrently.
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Dedicated worker pool size; `None` uses the global pool.
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: default_true(),
            worker_threads: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_true() -> bool {
    true
}

const fn default_band_medium() -> f64 {
    0.25
}

const fn default_band_high() -> f64 {
    0.5
}

const fn default_band_critical() -> f64 {
    0.75
}

const fn default_high_risk_percentile() -> f64 {
    90.0
}

const fn default_max_passes() -> usize {
    100
}

const fn default_max_levels() -> usize {
    32
}

const fn default_resolution() -> f64 {
    1.0
}

const fn default_min_modularity_gain() -> f64 {
    1e-7
}

const fn default_eigenvector_max_iter() -> usize {
    1000
}

const fn default_eigenvector_tolerance() -> f64 {
    1e-9
}

const fn default_top_k() -> usize {
    10
}

const fn default_trials() -> usize {
    200
}

const fn default_max_steps() -> usize {
    50
}

const fn default_propagation_seed() -> u64 {
    42
}

const fn default_max_seed_set() -> usize {
    5
}

const fn default_single_seed_limit() -> usize {
    25
}

const fn default_random_trials() -> usize {
    20
}

const fn default_robustness_seed() -> u64 {
    7
}
