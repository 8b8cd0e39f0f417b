//! Output formatting and persistence for analysis results.
//!
//! Tables are written as CSV; undefined values (trend near the edges, the
//! mean of an empty bin, an undefined correlation) are written as empty cells.
//! The run summary is written as pretty-printed JSON.

use anyhow::Result;
use chrono::NaiveDateTime;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::analyzers::types::{AggregationResult, CorrelationMatrix, DecompositionResult};

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl std::fmt::Debug) {
    debug!("{:#?}", value);
}

#[derive(Serialize)]
struct DecompositionRow {
    timestamp: NaiveDateTime,
    observed: f64,
    trend: Option<f64>,
    seasonal: f64,
    residual: Option<f64>,
}

#[derive(Serialize)]
struct BinRow {
    label: String,
    low: f64,
    high: f64,
    count: usize,
    mean: Option<f64>,
    stddev: Option<f64>,
}

fn create_writer(path: &Path) -> Result<csv::Writer<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    Ok(WriterBuilder::new().has_headers(true).from_writer(file))
}

/// Writes `timestamp,observed,trend,seasonal,residual`, one row per sample.
pub fn write_decomposition(path: &Path, result: &DecompositionResult) -> Result<()> {
    let mut writer = create_writer(path)?;

    for i in 0..result.len() {
        writer.serialize(DecompositionRow {
            timestamp: result.timestamps[i],
            observed: result.observed[i],
            trend: result.trend[i],
            seasonal: result.seasonal[i],
            residual: result.residual[i],
        })?;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = result.len(), "Decomposition written");
    Ok(())
}

/// Writes `label,low,high,count,mean,stddev`, one row per bin.
pub fn write_aggregation(path: &Path, result: &AggregationResult) -> Result<()> {
    let mut writer = create_writer(path)?;

    for b in &result.bins {
        writer.serialize(BinRow {
            label: b.bin.label(),
            low: b.bin.low,
            high: b.bin.high,
            count: b.count,
            mean: b.mean,
            stddev: b.stddev,
        })?;
    }
    writer.flush()?;

    debug!(path = %path.display(), bins = result.len(), "Aggregation written");
    Ok(())
}

/// Writes the matrix with a leading `field` column and one column per field.
pub fn write_correlation(path: &Path, matrix: &CorrelationMatrix) -> Result<()> {
    let mut writer = create_writer(path)?;

    let mut header = vec!["field".to_string()];
    header.extend(matrix.fields.iter().map(|f| f.to_string()));
    writer.write_record(&header)?;

    for (field, row) in matrix.fields.iter().zip(&matrix.values) {
        let mut record = vec![field.to_string()];
        record.extend(row.iter().map(|r| r.map(|v| v.to_string()).unwrap_or_default()));
        writer.write_record(&record)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), "Correlation matrix written");
    Ok(())
}

/// Writes any serializable value as pretty-printed JSON.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}
