//! CSV ingestion for the hourly ridership table.
//!
//! Accepts plain or gzip-compressed (`.gz`) input. Every row is validated
//! before the [`Dataset`] is built, so the analyzers only ever see clean data.

use chrono::NaiveDateTime;
use flate2::read::GzDecoder;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

use crate::dataset::{Dataset, Observation, WeatherCode};
use crate::error::IngestionError;

/// Columns that must be present in the header.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "timestamp",
    "cnt",
    "t1",
    "t2",
    "hum",
    "wind_speed",
    "weather_code",
];

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// A single row as it appears in the CSV, before validation.
#[derive(Debug, Deserialize)]
struct RawRecord {
    timestamp: String,
    cnt: f64,
    t1: f64,
    t2: f64,
    hum: f64,
    wind_speed: f64,
    weather_code: f64,
    is_holiday: Option<f64>,
    is_weekend: Option<f64>,
    season: Option<f64>,
}

/// Loads and validates the table at `path`.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Dataset, IngestionError> {
    let path = path.as_ref();
    let file = File::open(path)?;

    let reader: Box<dyn Read> = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        debug!("Decompressing gzip input");
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let dataset = read_dataset(reader)?;
    info!(rows = dataset.len(), "Dataset loaded");
    Ok(dataset)
}

/// Parses a table from any reader. The header is checked before any row.
pub fn read_dataset<R: Read>(reader: R) -> Result<Dataset, IngestionError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(IngestionError::MissingColumns(missing));
    }

    let mut observations = Vec::new();
    for (idx, result) in rdr.deserialize().enumerate() {
        let raw: RawRecord = result?;
        observations.push(validate(idx + 1, raw)?);
    }

    Dataset::new(observations)
}

fn parse_timestamp(row: usize, value: &str) -> Result<NaiveDateTime, IngestionError> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| IngestionError::InvalidTimestamp {
            row,
            value: value.to_string(),
        })
}

fn invalid(row: usize, column: &str, reason: impl Into<String>) -> IngestionError {
    IngestionError::InvalidValue {
        row,
        column: column.to_string(),
        reason: reason.into(),
    }
}

/// Accepts integral values (`182` or `182.0`) within `0..=max`.
fn non_negative_integer(row: usize, column: &str, value: f64, max: f64) -> Result<f64, IngestionError> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > max {
        return Err(invalid(
            row,
            column,
            format!("expected a non-negative integer, got {value}"),
        ));
    }
    Ok(value)
}

fn finite(row: usize, column: &str, value: f64) -> Result<f64, IngestionError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid(row, column, "value is not finite"))
    }
}

fn flag(row: usize, column: &str, value: Option<f64>) -> Result<Option<bool>, IngestionError> {
    match value {
        None => Ok(None),
        Some(v) if v == 0.0 => Ok(Some(false)),
        Some(v) if v == 1.0 => Ok(Some(true)),
        Some(v) => Err(invalid(row, column, format!("expected 0 or 1, got {v}"))),
    }
}

fn validate(row: usize, raw: RawRecord) -> Result<Observation, IngestionError> {
    let timestamp = parse_timestamp(row, &raw.timestamp)?;
    let count = non_negative_integer(row, "cnt", raw.cnt, u32::MAX as f64)?;
    let weather_code = non_negative_integer(row, "weather_code", raw.weather_code, u16::MAX as f64)?;

    let humidity = finite(row, "hum", raw.hum)?;
    if !(0.0..=100.0).contains(&humidity) {
        return Err(invalid(row, "hum", format!("{humidity} is outside 0..=100")));
    }

    let wind_speed = finite(row, "wind_speed", raw.wind_speed)?;
    if wind_speed < 0.0 {
        return Err(invalid(row, "wind_speed", "negative wind speed"));
    }

    let season = match raw.season {
        None => None,
        Some(v) => Some(non_negative_integer(row, "season", v, 3.0)? as u8),
    };

    Ok(Observation {
        timestamp,
        count: count as u32,
        t1: finite(row, "t1", raw.t1)?,
        t2: finite(row, "t2", raw.t2)?,
        humidity,
        wind_speed,
        weather_code: WeatherCode(weather_code as u16),
        is_holiday: flag(row, "is_holiday", raw.is_holiday)?,
        is_weekend: flag(row, "is_weekend", raw.is_weekend)?,
        season,
    })
}
