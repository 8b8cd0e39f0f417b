//! Error types for ingestion and analysis.

use thiserror::Error;

/// Errors raised while loading the ridership table. Always fatal for a run.
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// `row` is 1-based and counts data rows only.
    #[error("row {row}: unparseable timestamp {value:?}")]
    InvalidTimestamp { row: usize, value: String },

    #[error("row {row}: invalid value in column {column}: {reason}")]
    InvalidValue {
        row: usize,
        column: String,
        reason: String,
    },

    #[error("duplicate timestamp {timestamp}")]
    DuplicateTimestamp { timestamp: String },

    #[error("input contains no data rows")]
    Empty,
}

/// Errors raised by the decomposer and the binned aggregator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("insufficient data: need more than {needed} points, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("length mismatch: covariate has {covariate} values, target has {target}")]
    LengthMismatch { covariate: usize, target: usize },

    #[error("invalid bin count: {0}")]
    InvalidBinCount(usize),

    #[error("invalid seasonal period: {0}")]
    InvalidPeriod(usize),

    #[error("multiplicative model requires strictly positive values")]
    NonPositiveValues,

    #[error("empty input data")]
    EmptyInput,

    #[error("timestamps are not strictly increasing")]
    UnsortedTimestamps,
}
