pub mod analyze;
pub mod spread;
pub mod validate;

use std::path::Path;

use strife_analysis::AnalysisEngine;
use strife_core::{AnalysisConfig, ErrorCode, LoadedRecords, load_config};
use tracing::debug;

use crate::output::{CliError, OutputMode, report};

/// Engine configured from `--config`, or defaults when absent.
pub fn engine_from(config: Option<&Path>, output: OutputMode) -> anyhow::Result<AnalysisEngine> {
    let config = match config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(err) => {
                return Err(report(
                    output,
                    &CliError::coded(ErrorCode::ConfigParseError, format!("{err:#}")),
                ));
            }
        },
        None => AnalysisConfig::default(),
    };
    debug!(?config, "configuration loaded");
    Ok(AnalysisEngine::new(config))
}

/// Load `input`. A fatal [`strife_core::LoadError`] is rendered here.
pub fn load_records(
    engine: &AnalysisEngine,
    input: &Path,
    output: OutputMode,
) -> anyhow::Result<LoadedRecords> {
    match engine.loader().load_path(input) {
        Ok(records) => Ok(records),
        Err(err) => {
            debug!(input = %input.display(), error = %err, "input rejected");
            Err(report(output, &CliError::from(&err)))
        }
    }
}
