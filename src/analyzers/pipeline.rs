//! One full analysis run over a loaded dataset.
//!
//! Each covariate is aggregated independently: a failure for one is recorded
//! in the [`Report`] and does not stop the others.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::analyzers::aggregate::aggregate;
use crate::analyzers::correlation::correlation_matrix;
use crate::analyzers::decompose::decompose;
use crate::analyzers::types::{AggregationResult, CorrelationMatrix, DecompositionResult};
use crate::config::{AnalysisConfig, CovariateSpec};
use crate::dataset::{Dataset, Field};
use crate::error::AnalysisError;

/// Aggregation outcome for one configured covariate.
#[derive(Debug, Clone)]
pub struct CovariateOutcome {
    pub spec: CovariateSpec,
    pub result: Result<AggregationResult, AnalysisError>,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub rows: usize,
    pub time_range: Option<(NaiveDateTime, NaiveDateTime)>,
    pub target: Field,
    pub decomposition: Result<DecompositionResult, AnalysisError>,
    pub aggregations: Vec<CovariateOutcome>,
    pub correlation: CorrelationMatrix,
}

/// Aggregates `target` against each covariate in `specs`.
pub fn aggregate_covariates(
    dataset: &Dataset,
    target: Field,
    specs: &[CovariateSpec],
    bin_count: usize,
) -> Vec<CovariateOutcome> {
    let target_values = dataset.column(target);

    specs
        .iter()
        .map(|spec| {
            let result = aggregate(&dataset.column(spec.field), &target_values, bin_count);
            match &result {
                Ok(agg) => info!(
                    covariate = %spec.field,
                    bins = agg.len(),
                    "Covariate aggregated"
                ),
                Err(e) => error!(covariate = %spec.field, error = %e, "Covariate aggregation failed"),
            }
            CovariateOutcome {
                spec: spec.clone(),
                result,
            }
        })
        .collect()
}

/// Decomposes the target, bins it against every covariate, and correlates
/// all configured columns.
#[tracing::instrument(skip_all, fields(rows = dataset.len(), period = config.period))]
pub fn run(dataset: &Dataset, config: &AnalysisConfig) -> Report {
    let decomposition = decompose(&dataset.series(config.target), config.period, config.model);
    match &decomposition {
        Ok(d) => info!(defined = d.defined_len(), "Decomposition complete"),
        Err(e) => error!(error = %e, "Decomposition failed"),
    }

    let aggregations =
        aggregate_covariates(dataset, config.target, &config.covariates, config.bin_count);

    let correlation = correlation_matrix(dataset, &config.correlation_fields());

    Report {
        rows: dataset.len(),
        time_range: dataset.time_range(),
        target: config.target,
        decomposition,
        aggregations,
        correlation,
    }
}

/// Status of one step in the summary: either a short result or an error message.
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StepStatus<T> {
    Ok(T),
    Failed { error: String },
}

impl<T> StepStatus<T> {
    fn from_result<R>(result: &Result<R, AnalysisError>, f: impl FnOnce(&R) -> T) -> Self {
        match result {
            Ok(r) => StepStatus::Ok(f(r)),
            Err(e) => StepStatus::Failed {
                error: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DecompositionSummary {
    pub period: usize,
    pub defined_points: usize,
    pub pattern: Vec<f64>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CovariateSummary {
    pub field: Field,
    pub title: String,
    pub label: String,
    pub result: StepStatus<AggregationResult>,
}

/// Serializable overview of a [`Report`], written as `summary.json`.
#[derive(Debug, Serialize, PartialEq)]
pub struct ReportSummary {
    pub generated_at: DateTime<Utc>,
    pub rows: usize,
    pub first_timestamp: Option<NaiveDateTime>,
    pub last_timestamp: Option<NaiveDateTime>,
    pub target: Field,
    pub decomposition: StepStatus<DecompositionSummary>,
    pub covariates: Vec<CovariateSummary>,
    pub correlation: CorrelationMatrix,
}

impl Report {
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            generated_at: Utc::now(),
            rows: self.rows,
            first_timestamp: self.time_range.map(|r| r.0),
            last_timestamp: self.time_range.map(|r| r.1),
            target: self.target,
            decomposition: StepStatus::from_result(&self.decomposition, |d| DecompositionSummary {
                period: d.period,
                defined_points: d.defined_len(),
                pattern: d.pattern().to_vec(),
            }),
            covariates: self
                .aggregations
                .iter()
                .map(|o| CovariateSummary {
                    field: o.spec.field,
                    title: o.spec.title.clone(),
                    label: o.spec.label.clone(),
                    result: StepStatus::from_result(&o.result, |a| a.clone()),
                })
                .collect(),
            correlation: self.correlation.clone(),
        }
    }

    pub fn failed_covariates(&self) -> usize {
        self.aggregations.iter().filter(|o| o.result.is_err()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Observation, WeatherCode};
    use chrono::{Duration, NaiveDate};

    fn dataset(hours: i64) -> Dataset {
        let start = NaiveDate::from_ymd_opt(2015, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let observations = (0..hours)
            .map(|i| Observation {
                timestamp: start + Duration::hours(i),
                count: (200 + 50 * (i % 24)) as u32,
                t1: 10.0 + (i % 24) as f64 * 0.5,
                t2: 9.0 + (i % 24) as f64 * 0.5,
                humidity: 60.0 + (i % 5) as f64,
                wind_speed: 12.0,
                weather_code: WeatherCode((i % 3) as u16),
                is_holiday: Some(false),
                is_weekend: Some(false),
                season: Some(1),
            })
            .collect();
        Dataset::new(observations).unwrap()
    }

    #[test]
    fn test_run_produces_all_outputs() {
        let ds = dataset(24 * 4);
        let report = run(&ds, &AnalysisConfig::default());

        assert_eq!(report.rows, 96);
        let d = report.decomposition.as_ref().unwrap();
        assert_eq!(d.len(), 96);
        assert_eq!(report.aggregations.len(), 4);
        assert_eq!(report.failed_covariates(), 0);

        // constant wind speed collapses to a single bin
        let wind = report
            .aggregations
            .iter()
            .find(|o| o.spec.field == Field::WindSpeed)
            .unwrap();
        assert_eq!(wind.result.as_ref().unwrap().len(), 1);

        assert_eq!(report.correlation.fields.len(), 6);
    }

    #[test]
    fn test_short_series_fails_only_decomposition() {
        let ds = dataset(30);
        let report = run(&ds, &AnalysisConfig::default());

        assert_eq!(
            report.decomposition.as_ref().unwrap_err(),
            &AnalysisError::InsufficientData { needed: 48, got: 30 }
        );
        assert_eq!(report.failed_covariates(), 0);

        let summary = report.summary();
        assert!(matches!(summary.decomposition, StepStatus::Failed { .. }));
        assert_eq!(summary.covariates.len(), 4);
    }

    #[test]
    fn test_one_failing_covariate_does_not_stop_others() {
        let ds = dataset(10);
        let specs = vec![
            CovariateSpec::for_field(Field::Humidity),
            CovariateSpec::for_field(Field::RealTemperature),
        ];
        let outcomes = aggregate_covariates(&ds, Field::Count, &specs, 0);
        assert!(outcomes.iter().all(|o| o.result.is_err()));

        let outcomes = aggregate_covariates(&ds, Field::Count, &specs, 3);
        assert!(outcomes.iter().all(|o| o.result.is_ok()));
        assert_eq!(outcomes[1].spec.field, Field::RealTemperature);
    }

    #[test]
    fn test_summary_serializes() {
        let ds = dataset(72);
        let summary = run(&ds, &AnalysisConfig::default()).summary();
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["rows"], 72);
        assert_eq!(json["target"], "cnt");
        assert_eq!(json["decomposition"]["status"], "ok");
        assert_eq!(json["decomposition"]["period"], 24);
        assert_eq!(json["covariates"][0]["field"], "t1");
    }
}
