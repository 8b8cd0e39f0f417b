//! Classical seasonal decomposition with a fixed period.
//!
//! The trend is a centered moving average over one period (a `2 x period`
//! average for even periods, so the window stays centered on a sample). The
//! seasonal pattern is the per-phase average of the detrended series,
//! normalized to zero mean (additive) or unit mean (multiplicative), then tiled
//! across the whole series.

use tracing::debug;

use crate::analyzers::types::{DecompositionModel, DecompositionResult};
use crate::analyzers::utility::mean;
use crate::dataset::Series;
use crate::error::AnalysisError;

/// Splits `series` into trend, seasonal and residual components.
///
/// # Errors
///
/// * [`AnalysisError::InvalidPeriod`] if `period` is zero.
/// * [`AnalysisError::InsufficientData`] unless `series.len() > 2 * period`.
/// * [`AnalysisError::NonPositiveValues`] for the multiplicative model when
///   any observation is `<= 0`.
#[tracing::instrument(skip(series), fields(len = series.len()))]
pub fn decompose(
    series: &Series,
    period: usize,
    model: DecompositionModel,
) -> Result<DecompositionResult, AnalysisError> {
    if period == 0 {
        return Err(AnalysisError::InvalidPeriod(period));
    }

    let observed = series.values();
    let n = observed.len();
    let needed = period.checked_mul(2).unwrap_or(usize::MAX);
    if n <= needed {
        return Err(AnalysisError::InsufficientData { needed, got: n });
    }

    if model == DecompositionModel::Multiplicative && observed.iter().any(|v| *v <= 0.0) {
        return Err(AnalysisError::NonPositiveValues);
    }

    let trend = centered_moving_average(observed, period);

    let detrended: Vec<Option<f64>> = observed
        .iter()
        .zip(&trend)
        .map(|(x, t)| {
            t.map(|t| match model {
                DecompositionModel::Additive => x - t,
                DecompositionModel::Multiplicative => x / t,
            })
        })
        .collect();

    let pattern = seasonal_pattern(&detrended, period, model);
    let seasonal: Vec<f64> = (0..n).map(|i| pattern[i % period]).collect();

    let residual = observed
        .iter()
        .zip(&trend)
        .zip(&seasonal)
        .map(|((x, t), s)| {
            t.map(|t| match model {
                DecompositionModel::Additive => x - t - s,
                DecompositionModel::Multiplicative => x / (t * s),
            })
        })
        .collect();

    debug!(period, ?model, "Series decomposed");

    Ok(DecompositionResult {
        model,
        period,
        timestamps: series.timestamps().to_vec(),
        observed: observed.to_vec(),
        trend,
        seasonal,
        residual,
    })
}

/// Weights of the centered moving average for `period`.
///
/// Odd periods use `period` equal weights. Even periods use `period + 1`
/// weights with half weight on both ends.
fn window_weights(period: usize) -> Vec<f64> {
    let p = period as f64;
    if period % 2 == 0 {
        let mut w = vec![1.0 / p; period + 1];
        w[0] = 0.5 / p;
        w[period] = 0.5 / p;
        w
    } else {
        vec![1.0 / p; period]
    }
}

/// Centered moving average, `None` for the first and last `period / 2` points.
pub fn centered_moving_average(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let half = period / 2;
    let weights = window_weights(period);

    let mut trend = vec![None; n];
    if n < weights.len() {
        return trend;
    }

    for (i, slot) in trend.iter_mut().enumerate().take(n - half).skip(half) {
        let window = &values[i - half..i - half + weights.len()];
        let sum: f64 = window.iter().zip(&weights).map(|(v, w)| v * w).sum();
        *slot = Some(sum);
    }

    trend
}

/// Per-phase average of the defined detrended values, normalized for `model`.
fn seasonal_pattern(detrended: &[Option<f64>], period: usize, model: DecompositionModel) -> Vec<f64> {
    let mut pattern: Vec<f64> = (0..period)
        .map(|phase| {
            let values: Vec<f64> = detrended
                .iter()
                .skip(phase)
                .step_by(period)
                .filter_map(|v| *v)
                .collect();
            mean(&values)
        })
        .collect();

    let level = mean(&pattern);
    match model {
        DecompositionModel::Additive => pattern.iter_mut().for_each(|s| *s -= level),
        DecompositionModel::Multiplicative => pattern.iter_mut().for_each(|s| *s /= level),
    }

    pattern
}
