//! Equal-width binning of a covariate with per-bin target means.

use tracing::debug;

use crate::analyzers::types::{AggregationResult, Bin, BinAggregate};
use crate::analyzers::utility::{finite_range, mean, stddev};
use crate::error::AnalysisError;

/// Edges of `bin_count` equal-width bins over `[min, max]`.
///
/// Returns `bin_count + 1` ascending edges. The first edge is exactly `min`
/// and the last exactly `max`. Edges are interpolated rather than stepped by
/// `max - min`, which overflows for ranges wider than `f64::MAX`.
pub fn bin_edges(min: f64, max: f64, bin_count: usize) -> Vec<f64> {
    let n = bin_count as f64;
    let mut edges: Vec<f64> = (0..bin_count)
        .map(|k| {
            let f = k as f64 / n;
            min * (1.0 - f) + max * f
        })
        .collect();
    edges.push(max);
    edges
}

/// Index of the bin holding `value`, resolved against the same `edges` used
/// for labels so boundary values always land in the bin that starts there.
fn locate(edges: &[f64], value: f64) -> usize {
    let last = edges.len() - 2;
    let (min, max) = (edges[0], edges[last + 1]);
    // halved so that the spans stay finite for extreme ranges
    let span = max / 2.0 - min / 2.0;
    let estimate = ((value / 2.0 - min / 2.0) / span * (last + 1) as f64).floor();
    let mut idx = if estimate.is_finite() && estimate > 0.0 {
        (estimate as usize).min(last)
    } else {
        0
    };

    while idx > 0 && value < edges[idx] {
        idx -= 1;
    }
    while idx < last && value >= edges[idx + 1] {
        idx += 1;
    }
    idx
}

/// Groups `target` by equal-width bins of `covariate` and averages each bin.
///
/// Observations with a non-finite covariate are skipped. When every finite
/// covariate value is equal, a single closed bin `[v, v]` holds them all.
/// Bins without observations report `mean: None`.
///
/// # Errors
///
/// * [`AnalysisError::InvalidBinCount`] if `bin_count` is zero.
/// * [`AnalysisError::LengthMismatch`] if the slices differ in length.
/// * [`AnalysisError::EmptyInput`] if there is no finite covariate value.
pub fn aggregate(
    covariate: &[f64],
    target: &[f64],
    bin_count: usize,
) -> Result<AggregationResult, AnalysisError> {
    if bin_count == 0 {
        return Err(AnalysisError::InvalidBinCount(bin_count));
    }
    if covariate.len() != target.len() {
        return Err(AnalysisError::LengthMismatch {
            covariate: covariate.len(),
            target: target.len(),
        });
    }

    let (min_v, max_v) = finite_range(covariate).ok_or(AnalysisError::EmptyInput)?;

    let bins: Vec<Bin> = if min_v == max_v {
        vec![Bin {
            low: min_v,
            high: max_v,
            closed: true,
        }]
    } else {
        let edges = bin_edges(min_v, max_v, bin_count);
        edges
            .windows(2)
            .enumerate()
            .map(|(i, w)| Bin {
                low: w[0],
                high: w[1],
                closed: i == bin_count - 1,
            })
            .collect()
    };

    let mut members: Vec<Vec<f64>> = vec![Vec::new(); bins.len()];
    if bins.len() == 1 {
        members[0] = covariate
            .iter()
            .zip(target)
            .filter(|(c, _)| c.is_finite())
            .map(|(_, t)| *t)
            .collect();
    } else {
        let edges: Vec<f64> = bins.iter().map(|b| b.low).chain([max_v]).collect();
        for (c, t) in covariate.iter().zip(target) {
            if c.is_finite() {
                members[locate(&edges, *c)].push(*t);
            }
        }
    }

    let bins: Vec<BinAggregate> = bins
        .into_iter()
        .zip(members)
        .map(|(bin, values)| {
            let (avg, sd) = if values.is_empty() {
                (None, None)
            } else {
                let m = mean(&values);
                (Some(m), Some(stddev(&values, m)))
            };
            BinAggregate {
                bin,
                count: values.len(),
                mean: avg,
                stddev: sd,
            }
        })
        .collect();

    debug!(
        bins = bins.len(),
        empty_bins = bins.iter().filter(|b| b.count == 0).count(),
        min = min_v,
        max = max_v,
        "Covariate binned"
    );

    Ok(AggregationResult { bins })
}
