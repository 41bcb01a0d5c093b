//! `strife analyze`: full conflict network report.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use strife_analysis::AnalysisReport;
use tracing::warn;

use super::{engine_from, load_records};
use crate::output::{OutputMode, fmt_f64, fmt_opt, pretty_kv, pretty_section, render_mode};

/// How many ranked entries the human renderers print per list.
const SHOWN: usize = 5;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Input document (.json, .yaml, or .yml).
    pub input: PathBuf,

    /// TOML analysis configuration.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

pub fn run_analyze(args: &AnalyzeArgs, output: OutputMode) -> anyhow::Result<()> {
    let engine = engine_from(args.config.as_deref(), output)?;
    let records = load_records(&engine, &args.input, output)?;
    let report = engine.run_comprehensive_analysis(&records);
    for failure in &report.failures {
        warn!(section = %failure.section, message = %failure.message, "section degraded");
    }
    render_mode(output, &report, render_text, render_pretty)
}

fn render_text(report: &AnalysisReport, w: &mut dyn Write) -> io::Result<()> {
    let topo = &report.topology;
    writeln!(w, "graph.nodes={}", report.graph.node_count)?;
    writeln!(w, "graph.edges={}", report.graph.edge_count)?;
    writeln!(w, "graph.hash={}", report.graph.content_hash)?;
    writeln!(w, "topology.density={}", topo.density)?;
    writeln!(w, "topology.global_clustering={}", topo.global_clustering)?;
    writeln!(w, "topology.components={}", topo.component_count)?;
    writeln!(w, "topology.diameter={}", topo.diameter.map_or_else(|| "null".to_string(), |d| d.to_string()))?;
    writeln!(w, "intensity.mean={}", report.intensity.mean)?;
    writeln!(w, "intensity.high_risk_pairs={}", report.intensity.high_risk_pairs.len())?;
    writeln!(w, "communities.count={}", report.communities.community_count)?;
    writeln!(w, "communities.modularity={}", report.communities.modularity)?;
    writeln!(w, "centrality.eigenvector_fallback={}", report.centrality.eigenvector.fallback)?;
    writeln!(w, "propagation.transmission_rate={}", report.propagation.transmission_rate)?;
    writeln!(w, "robustness.systemic_risk_score={}", report.robustness.systemic_risk_score)?;
    writeln!(w, "robustness.articulation_points={}", report.robustness.articulation_points.len())?;
    writeln!(w, "issues={}", report.issues.len())?;
    for failure in &report.failures {
        writeln!(w, "failure.{}={}", failure.section, failure.message)?;
    }
    Ok(())
}

fn render_pretty(report: &AnalysisReport, w: &mut dyn Write) -> io::Result<()> {
    let topo = &report.topology;
    pretty_section(w, "Graph")?;
    pretty_kv(w, "Entities", report.graph.node_count.to_string())?;
    pretty_kv(w, "Relations", report.graph.edge_count.to_string())?;
    pretty_kv(w, "Aggregation", report.graph.aggregation.as_str())?;
    pretty_kv(w, "Content hash", &report.graph.content_hash)?;
    writeln!(w)?;

    pretty_section(w, "Topology")?;
    pretty_kv(w, "Density", fmt_f64(topo.density))?;
    pretty_kv(w, "Clustering (global)", fmt_f64(topo.global_clustering))?;
    pretty_kv(w, "Clustering (average)", fmt_f64(topo.average_clustering))?;
    pretty_kv(
        w,
        "Components",
        format!("{} (largest {})", topo.component_count, topo.largest_component_size),
    )?;
    pretty_kv(w, "Isolated", topo.isolated_nodes.to_string())?;
    pretty_kv(w, "Avg path length", fmt_opt(topo.average_path_length))?;
    pretty_kv(
        w,
        "Diameter",
        topo.diameter.map_or_else(|| "n/a".to_string(), |d| d.to_string()),
    )?;
    writeln!(w)?;

    let intensity = &report.intensity;
    pretty_section(w, "Intensity")?;
    pretty_kv(
        w,
        "Mean / median",
        format!("{} / {}", fmt_f64(intensity.mean), fmt_f64(intensity.median)),
    )?;
    pretty_kv(
        w,
        "Levels",
        format!(
            "low {} medium {} high {} critical {}",
            intensity.levels.low, intensity.levels.medium, intensity.levels.high, intensity.levels.critical
        ),
    )?;
    for pair in intensity.high_risk_pairs.iter().take(SHOWN) {
        writeln!(w, "  {} <-> {}  {}", pair.source, pair.target, fmt_f64(pair.weight))?;
    }
    writeln!(w)?;

    let communities = &report.communities;
    pretty_section(w, "Communities")?;
    pretty_kv(w, "Count", communities.community_count.to_string())?;
    pretty_kv(w, "Modularity", fmt_f64(communities.modularity))?;
    for community in communities.communities.iter().take(SHOWN) {
        writeln!(
            w,
            "  #{:<3} size {:<4} domain {}",
            community.id,
            community.size,
            community.dominant_domain.as_deref().unwrap_or("-")
        )?;
    }
    writeln!(w)?;

    pretty_section(w, "Centrality")?;
    if report.centrality.eigenvector.fallback {
        pretty_kv(w, "Eigenvector", "fell back to degree")?;
    }
    for (metric, ranked) in &report.centrality.top {
        let names: Vec<&str> = ranked.iter().take(SHOWN).map(|r| r.id.as_str()).collect();
        pretty_kv(w, metric, names.join(", "))?;
    }
    writeln!(w)?;

    let propagation = &report.propagation;
    pretty_section(w, "Propagation")?;
    pretty_kv(w, "Transmission rate", fmt_f64(propagation.transmission_rate))?;
    for point in &propagation.seed_set_curve {
        writeln!(w, "  {} seed(s)  {}", point.size, fmt_f64(point.expected_affected_fraction))?;
    }
    writeln!(w)?;

    let robustness = &report.robustness;
    pretty_section(w, "Robustness")?;
    pretty_kv(w, "Systemic risk", fmt_f64(robustness.systemic_risk_score))?;
    pretty_kv(w, "Random baseline", fmt_f64(robustness.random_strategy_score))?;
    pretty_kv(w, "Articulation points", robustness.articulation_points.join(", "))?;

    if !report.issues.is_empty() || !report.failures.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Diagnostics")?;
        pretty_kv(w, "Issues", report.issues.len().to_string())?;
        for failure in &report.failures {
            writeln!(w, "  {} failed: {}", failure.section, failure.message)?;
        }
    }
    Ok(())
}
