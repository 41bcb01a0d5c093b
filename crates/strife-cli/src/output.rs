//! Output modes shared by every subcommand.
//!
//! The mode is picked once per invocation: an explicit `--format` wins, then
//! `--json`, then the `FORMAT` env var (`pretty`, `text`, or `json`). With
//! none of those, a terminal gets [`OutputMode::Pretty`] and a pipe gets
//! [`OutputMode::Text`].
//!
//! Results go to stdout, errors to stderr, logs to stderr via `tracing`.

use std::fmt;
use std::io::{self, IsTerminal, Write};

use clap::ValueEnum;
use serde::Serialize;
use strife_analysis::AnalysisError;
use strife_core::{ErrorCode, LoadError};

/// Width of the dashed rule under pretty headings.
pub const PRETTY_RULE_WIDTH: usize = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Sectioned report for people.
    Pretty,
    /// One `key=value` per line, for grep and shell scripts.
    Text,
    /// Pretty-printed JSON document.
    Json,
}

impl OutputMode {
    fn from_env_value(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

fn pick_output_mode(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    format_env: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    format_flag
        .or_else(|| json_flag.then_some(OutputMode::Json))
        .or_else(|| format_env.and_then(OutputMode::from_env_value))
        .unwrap_or(if is_tty { OutputMode::Pretty } else { OutputMode::Text })
}

/// Resolve the mode for this process.
pub fn resolve_output_mode(format_flag: Option<OutputMode>, json_flag: bool) -> OutputMode {
    let env_value = std::env::var("FORMAT").ok();
    pick_output_mode(format_flag, json_flag, env_value.as_deref(), io::stdout().is_terminal())
}

/// Heading plus a dashed rule.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}\n{}", "-".repeat(PRETTY_RULE_WIDTH))
}

/// `key:` padded to a fixed column, then the value.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    let label = format!("{key}:");
    writeln!(w, "{label:<22} {}", value.as_ref())
}

pub fn fmt_f64(value: f64) -> String {
    format!("{value:.4}")
}

/// Like [`fmt_f64`], `n/a` for `None`.
pub fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), fmt_f64)
}

/// Write `value` to stdout in `mode`. JSON is shared; the other two modes
/// take their own renderers.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    write_value(&mut out, mode, value, text, pretty)
}

fn write_value<T: Serialize>(
    out: &mut dyn Write,
    mode: OutputMode,
    value: &T,
    text: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text(value, out)?,
        OutputMode::Pretty => pretty(value, out)?,
    }
    out.flush()?;
    Ok(())
}

/// Error payload rendered to stderr. In JSON mode it is wrapped as
/// `{"error": {...}}`.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Uncoded error with no suggestion.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }

    /// Error tagged with a stable code and that code's hint.
    pub fn coded(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: code.hint().map(str::to_string),
            error_code: Some(code.code().to_string()),
        }
    }
}

impl From<&LoadError> for CliError {
    fn from(err: &LoadError) -> Self {
        Self::coded(err.code(), err.to_string())
    }
}

impl From<&AnalysisError> for CliError {
    fn from(err: &AnalysisError) -> Self {
        Self::coded(err.code(), err.to_string())
    }
}

/// Marker for a failure already written by [`render_error`]; `main` only
/// sets the exit code for it, so stderr keeps exactly one error document.
#[derive(Debug)]
pub struct Reported;

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("error already reported")
    }
}

impl std::error::Error for Reported {}

/// Render `error` and return the [`Reported`] marker to propagate.
pub fn report(mode: OutputMode, error: &CliError) -> anyhow::Error {
    match render_error(mode, error) {
        Ok(()) => anyhow::Error::new(Reported),
        Err(err) => err,
    }
}

/// Write `error` to stderr in `mode`.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let mut out = io::stderr().lock();
    write_error(&mut out, mode, error)
}

fn write_error(out: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    if mode == OutputMode::Json {
        serde_json::to_writer_pretty(&mut *out, &serde_json::json!({ "error": error }))?;
        writeln!(out)?;
        return Ok(());
    }

    let tag = error
        .error_code
        .as_deref()
        .map_or_else(String::new, |code| format!("[{code}]"));
    writeln!(out, "error{tag}: {}", error.message)?;
    if let Some(suggestion) = error.suggestion.as_deref() {
        writeln!(out, "  suggestion: {suggestion}")?;
    }
    Ok(())
}
