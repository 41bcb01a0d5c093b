#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, Reported, render_error, resolve_output_mode};
use std::env;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "strife: conflict network analysis for narrative worlds",
    long_about = None
)]
struct Cli {
    /// Output format (overrides `FORMAT` and TTY detection).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Run the full analysis and print the report",
        after_help = "EXAMPLES:\n    strife analyze world.json\n    strife analyze world.yaml --config strife.toml --format json"
    )]
    Analyze(cmd::analyze::AnalyzeArgs),

    #[command(
        about = "Estimate conflict spread from seed entities or a domain",
        after_help = "EXAMPLES:\n    strife spread world.json --seed aldric --seed bryn\n    strife spread world.json --domain north --trials 500"
    )]
    Spread(cmd::spread::SpreadArgs),

    #[command(
        about = "Load and build the graph only, listing data-quality issues",
        after_help = "EXAMPLES:\n    strife validate world.json --json"
    )]
    Validate(cmd::validate::ValidateArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("STRIFE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "strife=debug,info"
        } else {
            "strife=info,warn"
        })
    });

    let format = env::var("STRIFE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    // Logs go to stderr so stdout stays parseable.
    let registry = tracing_subscriber::registry().with(filter);
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let output = resolve_output_mode(cli.format, cli.json);
    debug!(?output, "output mode resolved");

    let result = match cli.command {
        Commands::Analyze(ref args) => cmd::analyze::run_analyze(args, output),
        Commands::Spread(ref args) => cmd::spread::run_spread(args, output),
        Commands::Validate(ref args) => cmd::validate::run_validate(args, output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is::<Reported>() => ExitCode::FAILURE,
        Err(err) => {
            // Failures nobody rendered yet, such as a closed stdout.
            if render_error(output, &CliError::new(format!("{err:#}"))).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
