//! Error taxonomy for configuration, catalog, and pipeline failures.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::types::TableId;

/// Startup configuration rejected before the simulation begins.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
    #[error("order interval is inverted: min {min:?} > max {max:?}")]
    InvertedInterval { min: Duration, max: Duration },
    #[error("simulation speed must be at least 1")]
    ZeroSpeed,
}

/// Menu rejected while building or looking up dishes.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog has no dishes")]
    Empty,
    #[error("duplicate dish in catalog: {0}")]
    Duplicate(String),
    #[error("dish {name}: minimum cook time {min:?} exceeds maximum {max:?}")]
    InvertedCookTime {
        name: String,
        min: Duration,
        max: Duration,
    },
    #[error("unknown dish: {0}")]
    UnknownDish(String),
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Any failure while running the pipeline.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("table {table} is outside 1..={tables}")]
    TableOutOfRange { table: TableId, tables: TableId },
    /// A producer outlived the close of its queue. Close handles are owned by
    /// exactly one party, so reaching this is a sequencing defect.
    #[error("{queue} queue closed while a producer was still sending")]
    QueueClosed { queue: &'static str },
    #[error("failed to spawn {role} thread: {source}")]
    Spawn {
        role: String,
        #[source]
        source: io::Error,
    },
    #[error("{worker} thread panicked")]
    WorkerPanicked { worker: String },
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crate-wide result, defaulting to [`SimError`].
pub type Result<T, E = SimError> = std::result::Result<T, E>;
