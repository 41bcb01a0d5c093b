//! `strife validate`: load and build without analyzing.
//!
//! Data-quality issues are reported but never fail the command; only an
//! unreadable input does.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use strife_core::Issue;
use tracing::info;

use super::{engine_from, load_records};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Input document (.json, .yaml, or .yml).
    pub input: PathBuf,

    /// TOML analysis configuration (domain list, aggregation policy).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ValidationSummary {
    entities_loaded: usize,
    relations_loaded: usize,
    nodes: usize,
    edges: usize,
    content_hash: String,
    issues: Vec<Issue>,
}

pub fn run_validate(args: &ValidateArgs, output: OutputMode) -> anyhow::Result<()> {
    let engine = engine_from(args.config.as_deref(), output)?;
    let records = load_records(&engine, &args.input, output)?;
    let built = engine.build_graph(&records);

    let mut issues = records.issues.clone();
    issues.extend(built.issues);
    let summary = ValidationSummary {
        entities_loaded: records.entities.len(),
        relations_loaded: records.relations.len(),
        nodes: built.graph.node_count(),
        edges: built.graph.edge_count(),
        content_hash: built.graph.content_hash().to_string(),
        issues,
    };
    info!(issues = summary.issues.len(), "validation complete");
    render_mode(output, &summary, render_text, render_pretty)
}

fn issue_line(issue: &Issue) -> String {
    let stage = serde_json::to_value(issue.stage).ok();
    let kind = serde_json::to_value(issue.kind).ok();
    format!(
        "{}/{}: {}",
        stage.as_ref().and_then(|v| v.as_str()).unwrap_or("?"),
        kind.as_ref().and_then(|v| v.as_str()).unwrap_or("?"),
        issue.message
    )
}

fn render_text(summary: &ValidationSummary, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "entities={}", summary.entities_loaded)?;
    writeln!(w, "relations={}", summary.relations_loaded)?;
    writeln!(w, "nodes={}", summary.nodes)?;
    writeln!(w, "edges={}", summary.edges)?;
    writeln!(w, "content_hash={}", summary.content_hash)?;
    writeln!(w, "issues={}", summary.issues.len())?;
    for issue in &summary.issues {
        writeln!(w, "issue={}", issue_line(issue))?;
    }
    Ok(())
}

fn render_pretty(summary: &ValidationSummary, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Validation")?;
    pretty_kv(w, "Entities loaded", summary.entities_loaded.to_string())?;
    pretty_kv(w, "Relations loaded", summary.relations_loaded.to_string())?;
    pretty_kv(w, "Graph", format!("{} nodes, {} edges", summary.nodes, summary.edges))?;
    pretty_kv(w, "Content hash", &summary.content_hash)?;
    writeln!(w)?;
    if summary.issues.is_empty() {
        writeln!(w, "No issues.")?;
        return Ok(());
    }
    pretty_section(w, &format!("Issues ({})", summary.issues.len()))?;
    for issue in &summary.issues {
        writeln!(w, "  {}", issue_line(issue))?;
    }
    Ok(())
}
