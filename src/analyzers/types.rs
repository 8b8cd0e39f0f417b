//! Result types produced by the analyzers.

use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::dataset::Field;

/// How the seasonal and residual components combine with the trend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DecompositionModel {
    /// `observed = trend + seasonal + residual`
    #[default]
    Additive,
    /// `observed = trend * seasonal * residual`
    Multiplicative,
}

/// Four parallel components of one decomposed series.
///
/// `trend` and `residual` are `None` for the first and last `period / 2`
/// positions, where the centered moving average has no full window.
#[derive(Debug, Clone, PartialEq)]
pub struct DecompositionResult {
    pub model: DecompositionModel,
    pub period: usize,
    pub timestamps: Vec<NaiveDateTime>,
    pub observed: Vec<f64>,
    pub trend: Vec<Option<f64>>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<Option<f64>>,
}

impl DecompositionResult {
    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    /// One full cycle of the seasonal component, starting at phase 0.
    pub fn pattern(&self) -> &[f64] {
        &self.seasonal[..self.period.min(self.seasonal.len())]
    }

    /// Number of positions where the trend is defined.
    pub fn defined_len(&self) -> usize {
        self.trend.iter().filter(|t| t.is_some()).count()
    }
}

/// Half-open interval `[low, high)`, or `[low, high]` when `closed` is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    pub low: f64,
    pub high: f64,
    pub closed: bool,
}

impl Bin {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && (value < self.high || (self.closed && value == self.high))
    }

    /// Label used on chart axes, e.g. `"1.8-3.6"`.
    pub fn label(&self) -> String {
        format!("{:.1}-{:.1}", self.low, self.high)
    }
}

/// Target statistics for the observations that fell into one bin.
///
/// `mean` and `stddev` are `None` when the bin received no observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinAggregate {
    pub bin: Bin,
    pub count: usize,
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
}

/// Bins ordered by lower bound ascending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    pub bins: Vec<BinAggregate>,
}

impl AggregationResult {
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.bins.iter().map(|b| b.bin.label()).collect()
    }

    pub fn means(&self) -> Vec<Option<f64>> {
        self.bins.iter().map(|b| b.mean).collect()
    }

    /// Observations assigned to any bin.
    pub fn total_count(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Symmetric Pearson correlation matrix over a set of fields.
///
/// An entry is `None` when either column has zero variance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub fields: Vec<Field>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Field, b: Field) -> Option<f64> {
        let i = self.fields.iter().position(|f| *f == a)?;
        let j = self.fields.iter().position(|f| *f == b)?;
        self.values[i][j]
    }
}
