//! strife-core: record types, loading, configuration, and error codes.
//!
//! # Conventions
//!
//! - **Errors**: library failures are `thiserror` enums carrying an
//!   [`ErrorCode`]; config loading uses `anyhow::Result` with context.
//! - **Data quality**: recoverable row problems become [`Issue`]s, never errors.
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod error;
pub mod loader;
pub mod record;

pub use config::{AggregationPolicy, AnalysisConfig, CentralityMetric, load_config};
pub use error::{ErrorCode, LoadError};
pub use loader::{InputFormat, LoadedRecords, RecordLoader};
pub use record::{EntityKind, EntityRecord, Issue, IssueKind, IssueStage, RelationRecord};
