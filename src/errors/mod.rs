use std::path::PathBuf;
use thiserror::Error;

use crate::core::Timestamp;

#[derive(Error, Debug)]
pub enum WaterError {
    #[error("Load Error: {0}")]
    LoadError(#[from] LoadError),

    #[error("Schema Error: {0}")]
    SchemaError(#[from] SchemaError),

    #[error("Validation Error: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Policy Error: {0}")]
    PolicyError(#[from] PolicyError),

    #[error("Sink Error: {0}")]
    SinkError(#[from] SinkError),

    #[error("Model Error: {0}")]
    ModelError(#[from] ModelError),
}

/// Malformed or misaligned input tables. Raised before any scanning happens.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{source_name} has no data rows")]
    Empty { source_name: String },

    #[error("{source_name} line {line}: expected {expected} fields, found {found}")]
    RaggedRow {
        source_name: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{source_name} line {line}: invalid timestamp '{value}'")]
    BadTimestamp {
        source_name: String,
        line: usize,
        value: String,
    },

    #[error("{source_name} line {line}: column '{column}' has non-numeric value '{value}'")]
    BadValue {
        source_name: String,
        line: usize,
        column: String,
        value: String,
    },

    #[error("{source_name}: duplicate column '{column}'")]
    DuplicateColumn { source_name: String, column: String },

    #[error("{source_name}: column group '{group}' not found")]
    MissingGroup { source_name: String, group: String },

    #[error("malformed table: {0}")]
    Shape(String),

    #[error("timestamp axes differ: pressure has {pressure} rows, flow has {flow}")]
    AxisLength { pressure: usize, flow: usize },

    #[error("timestamp axes diverge at row {row}: pressure t={pressure}, flow t={flow}")]
    AxisOrder {
        row: usize,
        pressure: Timestamp,
        flow: Timestamp,
    },
}

/// Timestamp-axis mismatch detected when a scan starts. The whole scan is aborted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("timestamp axis length mismatch: flow has {flow} steps, pressure has {pressure}")]
    LengthMismatch { flow: usize, pressure: usize },

    #[error("timestamp axis mismatch at step {index}: flow t={flow}, pressure t={pressure}")]
    TimestampMismatch {
        index: usize,
        flow: Timestamp,
        pressure: Timestamp,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("missing field '{0}'")]
    MissingField(String),

    #[error("field '{field}' {reason}")]
    InvalidField { field: String, reason: String },

    #[error("invalid request body: {0}")]
    Body(String),
}

impl ValidationError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    #[error("cluster_flow_ratio must be a finite value greater than 1, got {0}")]
    RatioOutOfRange(f64),

    #[error("cluster_min_flow must be a finite, non-negative value, got {0}")]
    MinFlowOutOfRange(f64),

    #[error("low_pressure_m must be finite, got {0}")]
    LowPressureOutOfRange(f64),
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("report sink is not open")]
    NotOpen,
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("model expects features {found:?}, service schema is {expected:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("model artifact is malformed: {0}")]
    Malformed(String),
}

pub type WaterResult<T> = Result<T, WaterError>;
