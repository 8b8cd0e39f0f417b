//! Pearson correlation between ridership and the weather covariates.

use crate::analyzers::types::CorrelationMatrix;
use crate::analyzers::utility::mean;
use crate::dataset::{Dataset, Field};

/// Pearson correlation coefficient of two equally long samples.
///
/// Returns `None` for fewer than two points, mismatched lengths, or when
/// either sample has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let (mx, my) = (mean(x), mean(y));
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mx, b - my);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

/// Pairwise correlation matrix over `fields`, in the given order.
#[tracing::instrument(skip(dataset), fields(rows = dataset.len()))]
pub fn correlation_matrix(dataset: &Dataset, fields: &[Field]) -> CorrelationMatrix {
    let columns: Vec<Vec<f64>> = fields.iter().map(|f| dataset.column(*f)).collect();
    let n = fields.len();

    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pearson(&columns[i], &columns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        fields: fields.to_vec(),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Observation, WeatherCode};
    use chrono::{Duration, NaiveDate};

    const TOL: f64 = 1e-12;

    #[test]
    fn test_perfect_correlation() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < TOL);

        let neg = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&x, &neg).unwrap() + 1.0).abs() < TOL);
    }

    #[test]
    fn test_zero_variance_is_undefined() {
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]), None);
        assert_eq!(pearson(&[1.0], &[1.0]), None);
        assert_eq!(pearson(&[1.0, 2.0], &[1.0]), None);
    }

    #[test]
    fn test_matrix_is_symmetric() {
        let start = NaiveDate::from_ymd_opt(2016, 7, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let observations: Vec<Observation> = (0..6)
            .map(|i| Observation {
                timestamp: start + Duration::hours(i),
                count: (100 + 30 * i) as u32,
                t1: 15.0 + i as f64,
                t2: 14.0 + (i % 2) as f64,
                humidity: 80.0 - 2.0 * i as f64,
                wind_speed: 10.0,
                weather_code: WeatherCode(1),
                is_holiday: None,
                is_weekend: None,
                season: None,
            })
            .collect();
        let ds = Dataset::new(observations).unwrap();
        let fields = [Field::Count, Field::RealTemperature, Field::Humidity, Field::WindSpeed];

        let m = correlation_matrix(&ds, &fields);

        assert!((m.get(Field::Count, Field::RealTemperature).unwrap() - 1.0).abs() < TOL);
        assert!((m.get(Field::Count, Field::Humidity).unwrap() + 1.0).abs() < TOL);
        assert_eq!(m.get(Field::WindSpeed, Field::Count), None);
        assert_eq!(m.get(Field::Count, Field::FeelsLikeTemperature), None);
        for i in 0..fields.len() {
            for j in 0..fields.len() {
                assert_eq!(m.values[i][j], m.values[j][i]);
            }
        }
    }
}
