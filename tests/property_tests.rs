//! Property-based tests for the decomposer and the binned aggregator.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated series and covariates.

use bikeshare_eda::analyzers::aggregate::aggregate;
use bikeshare_eda::analyzers::decompose::decompose;
use bikeshare_eda::analyzers::types::DecompositionModel;
use bikeshare_eda::dataset::Series;
use bikeshare_eda::error::AnalysisError;
use chrono::NaiveDate;
use proptest::prelude::*;

fn make_series(values: Vec<f64>) -> Series {
    let start = NaiveDate::from_ymd_opt(2015, 1, 4)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    Series::hourly(start, values).unwrap()
}

/// Strategy for a period together with a series long enough to decompose.
fn period_and_values() -> impl Strategy<Value = (usize, Vec<f64>)> {
    (1usize..30).prop_flat_map(|period| {
        let min_len = 2 * period + 1;
        (
            Just(period),
            prop::collection::vec(0.0..5000.0_f64, min_len..min_len + 120),
        )
    })
}

/// Strategy for equally long covariate and target vectors.
fn covariate_and_target() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (1usize..200).prop_flat_map(|len| {
        (
            prop::collection::vec(-20.0..40.0_f64, len),
            prop::collection::vec(0.0..4000.0_f64, len),
        )
    })
}

// =============================================================================
// Property: additive decomposition
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn additive_identity_holds_where_trend_defined((period, values) in period_and_values()) {
        let result = decompose(&make_series(values), period, DecompositionModel::Additive).unwrap();

        for i in 0..result.len() {
            match (result.trend[i], result.residual[i]) {
                (Some(t), Some(r)) => {
                    let rebuilt = t + result.seasonal[i] + r;
                    prop_assert!((rebuilt - result.observed[i]).abs() < 1e-6);
                }
                (None, None) => {}
                _ => prop_assert!(false, "trend and residual disagree at {}", i),
            }
        }
    }

    #[test]
    fn seasonal_is_periodic_with_zero_mean((period, values) in period_and_values()) {
        let result = decompose(&make_series(values), period, DecompositionModel::Additive).unwrap();

        for i in 0..result.len() - period {
            prop_assert_eq!(result.seasonal[i], result.seasonal[i + period]);
        }
        let cycle_mean = result.pattern().iter().sum::<f64>() / period as f64;
        prop_assert!(cycle_mean.abs() < 1e-6);
    }

    #[test]
    fn trend_undefined_exactly_at_edges((period, values) in period_and_values()) {
        let n = values.len();
        let result = decompose(&make_series(values), period, DecompositionModel::Additive).unwrap();
        let half = period / 2;

        for (i, t) in result.trend.iter().enumerate() {
            prop_assert_eq!(t.is_none(), i < half || i >= n - half);
        }
    }

    #[test]
    fn short_series_is_rejected(period in 1usize..40, extra in 0usize..40) {
        let len = (2 * period).saturating_sub(extra);
        let result = decompose(&make_series(vec![1.0; len]), period, DecompositionModel::Additive);
        prop_assert_eq!(
            result.unwrap_err(),
            AnalysisError::InsufficientData { needed: 2 * period, got: len }
        );
    }
}

// =============================================================================
// Property: binned aggregation
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn no_observation_dropped_or_double_counted(
        (covariate, target) in covariate_and_target(),
        bin_count in 1usize..25
    ) {
        let result = aggregate(&covariate, &target, bin_count).unwrap();

        prop_assert_eq!(result.total_count(), covariate.len());

        let binned: f64 = result
            .bins
            .iter()
            .filter_map(|b| b.mean.map(|m| m * b.count as f64))
            .sum();
        let total: f64 = target.iter().sum();
        prop_assert!((binned - total).abs() < 1e-6 * total.max(1.0));
    }

    #[test]
    fn bins_ordered_and_sized(
        (covariate, target) in covariate_and_target(),
        bin_count in 1usize..25
    ) {
        let result = aggregate(&covariate, &target, bin_count).unwrap();

        let degenerate = covariate.iter().all(|c| *c == covariate[0]);
        prop_assert_eq!(result.len(), if degenerate { 1 } else { bin_count });
        prop_assert!(result.bins.windows(2).all(|w| w[0].bin.low < w[1].bin.low));
        prop_assert!(result.bins.last().unwrap().bin.closed);

        for b in &result.bins {
            prop_assert_eq!(b.count == 0, b.mean.is_none());
        }
    }

    #[test]
    fn binning_is_reproducible(
        (covariate, target) in covariate_and_target(),
        bin_count in 1usize..25
    ) {
        let first = aggregate(&covariate, &target, bin_count).unwrap();
        let second = aggregate(&covariate, &target, bin_count).unwrap();
        prop_assert_eq!(first.labels(), second.labels());
        prop_assert_eq!(first, second);
    }
}
