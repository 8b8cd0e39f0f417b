//! In-memory ridership table and the typed projections taken from it.

use chrono::{Duration, NaiveDateTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, IngestionError};

/// Numeric columns of the source table that can be projected into a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Field {
    #[serde(rename = "cnt")]
    #[value(name = "cnt")]
    Count,
    #[serde(rename = "t1")]
    #[value(name = "t1")]
    RealTemperature,
    #[serde(rename = "t2")]
    #[value(name = "t2")]
    FeelsLikeTemperature,
    #[serde(rename = "hum")]
    #[value(name = "hum")]
    Humidity,
    #[serde(rename = "wind_speed")]
    #[value(name = "wind_speed")]
    WindSpeed,
    #[serde(rename = "weather_code")]
    #[value(name = "weather_code")]
    WeatherCode,
}

impl Field {
    /// Column name as it appears in the CSV header.
    pub fn column(self) -> &'static str {
        match self {
            Field::Count => "cnt",
            Field::RealTemperature => "t1",
            Field::FeelsLikeTemperature => "t2",
            Field::Humidity => "hum",
            Field::WindSpeed => "wind_speed",
            Field::WeatherCode => "weather_code",
        }
    }

    pub fn value(self, obs: &Observation) -> f64 {
        match self {
            Field::Count => obs.count as f64,
            Field::RealTemperature => obs.t1,
            Field::FeelsLikeTemperature => obs.t2,
            Field::Humidity => obs.humidity,
            Field::WindSpeed => obs.wind_speed,
            Field::WeatherCode => obs.weather_code.0 as f64,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// Categorical weather condition code as published with the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct WeatherCode(pub u16);

/// One hourly row of the source table.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub count: u32,
    pub t1: f64,
    pub t2: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub weather_code: WeatherCode,
    pub is_holiday: Option<bool>,
    pub is_weekend: Option<bool>,
    pub season: Option<u8>,
}

/// Immutable, timestamp-ordered set of observations.
#[derive(Debug, Clone)]
pub struct Dataset {
    observations: Vec<Observation>,
}

impl Dataset {
    /// Sorts `observations` by timestamp and rejects empty or duplicated input.
    pub fn new(mut observations: Vec<Observation>) -> Result<Self, IngestionError> {
        if observations.is_empty() {
            return Err(IngestionError::Empty);
        }

        observations.sort_by_key(|o| o.timestamp);

        if let Some(pair) = observations
            .windows(2)
            .find(|w| w[0].timestamp == w[1].timestamp)
        {
            return Err(IngestionError::DuplicateTimestamp {
                timestamp: pair[0].timestamp.to_string(),
            });
        }

        Ok(Self { observations })
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// First and last timestamp of the table.
    pub fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let first = self.observations.first()?.timestamp;
        let last = self.observations.last()?.timestamp;
        Some((first, last))
    }

    /// Projects one field into a plain vector, in timestamp order.
    pub fn column(&self, field: Field) -> Vec<f64> {
        self.observations.iter().map(|o| field.value(o)).collect()
    }

    /// Projects one field into a timestamped series.
    pub fn series(&self, field: Field) -> Series {
        Series {
            timestamps: self.observations.iter().map(|o| o.timestamp).collect(),
            values: self.column(field),
        }
    }
}

/// Timestamp-ordered numeric sequence with no duplicate timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    timestamps: Vec<NaiveDateTime>,
    values: Vec<f64>,
}

impl Series {
    pub fn new(timestamps: Vec<NaiveDateTime>, values: Vec<f64>) -> Result<Self, AnalysisError> {
        if timestamps.len() != values.len() {
            return Err(AnalysisError::LengthMismatch {
                covariate: timestamps.len(),
                target: values.len(),
            });
        }
        if timestamps.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AnalysisError::UnsortedTimestamps);
        }
        Ok(Self { timestamps, values })
    }

    /// Builds a series with one sample per hour starting at `start`.
    ///
    /// Goes through [`Series::new`], so the same ordering checks apply.
    pub fn hourly(start: NaiveDateTime, values: Vec<f64>) -> Result<Self, AnalysisError> {
        let timestamps = (0..values.len())
            .map(|i| start + Duration::hours(i as i64))
            .collect();
        Self::new(timestamps, values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}
