//! `strife spread`: a single diffusion estimate.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{ArgGroup, Args};
use serde::Serialize;
use strife_analysis::PropagationModeler;
use strife_analysis::propagation::SpreadEstimate;
use tracing::info;

use super::{engine_from, load_records};
use crate::output::{CliError, OutputMode, fmt_f64, pretty_kv, pretty_section, render_mode, report};

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("origin").required(true).args(["seed", "domain"])))]
pub struct SpreadArgs {
    /// Input document (.json, .yaml, or .yml).
    pub input: PathBuf,

    /// Seed entity id (repeatable).
    #[arg(long = "seed", value_name = "ID")]
    pub seed: Vec<String>,

    /// Seed every entity assigned to this domain.
    #[arg(long, value_name = "NAME")]
    pub domain: Option<String>,

    /// Monte Carlo trials (overrides the config).
    #[arg(long, value_name = "N")]
    pub trials: Option<usize>,

    /// TOML analysis configuration.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct SpreadOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<String>,
    transmission_rate: f64,
    max_steps: usize,
    #[serde(flatten)]
    estimate: SpreadEstimate,
}

pub fn run_spread(args: &SpreadArgs, output: OutputMode) -> anyhow::Result<()> {
    if args.trials == Some(0) {
        return Err(report(output, &CliError::new("--trials must be at least 1")));
    }

    let engine = engine_from(args.config.as_deref(), output)?;
    let records = load_records(&engine, &args.input, output)?;
    let graph = engine.build_graph(&records).graph;

    let mut config = engine.config().propagation;
    if let Some(trials) = args.trials {
        config.trials = trials;
    }
    let modeler = PropagationModeler::new(config);

    let result = match args.domain {
        Some(ref domain) => modeler.simulate_domain(&graph, domain),
        None => {
            let seeds: Vec<&str> = args.seed.iter().map(String::as_str).collect();
            modeler.simulate(&graph, &seeds)
        }
    };
    let estimate = match result {
        Ok(estimate) => estimate,
        Err(err) => return Err(report(output, &CliError::from(&err))),
    };
    info!(
        seeds = estimate.seeds.len(),
        fraction = estimate.expected_affected_fraction,
        "spread estimated"
    );

    let outcome = SpreadOutcome {
        domain: args.domain.clone(),
        transmission_rate: modeler.transmission_rate(&graph),
        max_steps: config.max_steps,
        estimate,
    };
    render_mode(output, &outcome, render_text, render_pretty)
}

fn render_text(outcome: &SpreadOutcome, w: &mut dyn Write) -> io::Result<()> {
    if let Some(ref domain) = outcome.domain {
        writeln!(w, "domain={domain}")?;
    }
    writeln!(w, "seeds={}", outcome.estimate.seeds.join(","))?;
    writeln!(w, "trials={}", outcome.estimate.trials)?;
    writeln!(w, "transmission_rate={}", outcome.transmission_rate)?;
    writeln!(w, "expected_affected={}", outcome.estimate.expected_affected)?;
    writeln!(w, "expected_affected_fraction={}", outcome.estimate.expected_affected_fraction)?;
    writeln!(w, "steps={}", outcome.estimate.curve.len().saturating_sub(1))
}

fn render_pretty(outcome: &SpreadOutcome, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Conflict spread")?;
    if let Some(ref domain) = outcome.domain {
        pretty_kv(w, "Domain", domain)?;
    }
    pretty_kv(w, "Seeds", outcome.estimate.seeds.join(", "))?;
    pretty_kv(w, "Trials", outcome.estimate.trials.to_string())?;
    pretty_kv(w, "Transmission rate", fmt_f64(outcome.transmission_rate))?;
    pretty_kv(
        w,
        "Expected affected",
        format!(
            "{} ({})",
            fmt_f64(outcome.estimate.expected_affected),
            fmt_f64(outcome.estimate.expected_affected_fraction)
        ),
    )?;
    writeln!(w)?;
    pretty_section(w, "Mean infected fraction by step")?;
    for (step, fraction) in outcome.estimate.curve.iter().enumerate() {
        writeln!(w, "  {step:>3}  {}", fmt_f64(*fraction))?;
    }
    Ok(())
}
