//! Analysis configuration: seasonal period, bin count, and which covariates
//! to bin against the target.
//!
//! Stored as a JSON object on disk; every key is optional:
//! ```json
//! {
//!   "period": 24,
//!   "bin_count": 10,
//!   "model": "additive",
//!   "target": "cnt",
//!   "covariates": [
//!     { "field": "hum", "label": "Humidity (%)", "title": "Ridership vs humidity" }
//!   ]
//! }
//! ```

use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

use crate::analyzers::types::DecompositionModel;
use crate::dataset::Field;

/// One covariate to aggregate, with the captions used when it is rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovariateSpec {
    pub field: Field,
    pub label: String,
    pub title: String,
}

impl CovariateSpec {
    /// Default captions for a covariate column.
    pub fn for_field(field: Field) -> Self {
        let (label, title) = match field {
            Field::RealTemperature => ("Temperature t1 (°C)", "Ridership vs temperature t1"),
            Field::FeelsLikeTemperature => ("Temperature t2 (°C)", "Ridership vs temperature t2"),
            Field::Humidity => ("Humidity (%)", "Ridership vs humidity"),
            Field::WindSpeed => ("Wind speed (km/h)", "Ridership vs wind speed"),
            Field::WeatherCode => ("Weather code", "Ridership vs weather code"),
            Field::Count => ("Ride count", "Ridership vs ride count"),
        };
        Self {
            field,
            label: label.to_string(),
            title: title.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Samples per seasonal cycle. 24 is a daily cycle for hourly data.
    pub period: usize,
    pub bin_count: usize,
    pub model: DecompositionModel,
    pub target: Field,
    pub covariates: Vec<CovariateSpec>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            period: 24,
            bin_count: 10,
            model: DecompositionModel::Additive,
            target: Field::Count,
            covariates: [
                Field::RealTemperature,
                Field::FeelsLikeTemperature,
                Field::Humidity,
                Field::WindSpeed,
            ]
            .into_iter()
            .map(CovariateSpec::for_field)
            .collect(),
        }
    }
}

impl AnalysisConfig {
    /// Loads the config from a JSON file at `path`. Missing keys keep their defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Replaces the covariate list with default captions for `fields`.
    pub fn with_covariates(mut self, fields: &[Field]) -> Self {
        self.covariates = fields.iter().copied().map(CovariateSpec::for_field).collect();
        self
    }

    /// Applies command-line values on top of this config. `None` keeps the
    /// value from the file (or the default).
    pub fn with_overrides(
        mut self,
        period: Option<usize>,
        bin_count: Option<usize>,
        model: Option<DecompositionModel>,
    ) -> Self {
        if let Some(period) = period {
            self.period = period;
        }
        if let Some(bin_count) = bin_count {
            self.bin_count = bin_count;
        }
        if let Some(model) = model {
            self.model = model;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.period > 0, "period must be positive");
        ensure!(self.bin_count > 0, "bin_count must be positive");
        ensure!(!self.covariates.is_empty(), "at least one covariate is required");
        ensure!(
            self.covariates.iter().all(|c| c.field != self.target),
            "target {} cannot also be a covariate",
            self.target
        );
        Ok(())
    }

    /// Target, covariates and weather code, without repeats, for the correlation matrix.
    pub fn correlation_fields(&self) -> Vec<Field> {
        let mut fields = vec![self.target];
        for f in self
            .covariates
            .iter()
            .map(|c| c.field)
            .chain([Field::WeatherCode])
        {
            if !fields.contains(&f) {
                fields.push(f);
            }
        }
        fields
    }
}
