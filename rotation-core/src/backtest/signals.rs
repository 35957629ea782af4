// =================================================================
// backtest/signals.rs - Forecast to long/short codification
// =================================================================

use tracing::{debug, info};

use super::{
    AllocationMatrix, BacktestError, BenchmarkMatrix, Codification, ForecastMatrix, Position,
    SignalState, ValidityFlags,
};

/// Turns raw forecasts into one long/short row per period
pub struct SignalCodifier;

impl SignalCodifier {
    /// Codify every row in chronological order.
    ///
    /// Rows up to `lookback` are all long. Later rows split the assets at the
    /// median forecast when the forecast is valid, otherwise they repeat the
    /// previous row.
    pub fn codify(
        forecasts: &ForecastMatrix,
        flags: &ValidityFlags,
        lookback: usize,
    ) -> Result<Codification, BacktestError> {
        let n_periods = forecasts.n_periods();
        let n_assets = forecasts.n_assets();
        if flags.len() != n_periods {
            return Err(BacktestError::ShapeMismatch(format!(
                "{} validity flags for {} forecast rows",
                flags.len(),
                n_periods
            )));
        }

        let mut signals = AllocationMatrix::with_capacity(n_periods, n_assets);
        let mut states = Vec::with_capacity(n_periods);
        let mut invalid_count = 0;
        let mut previous = vec![Position::Long; n_assets];

        for i in 0..n_periods {
            let (state, row) = if i <= lookback {
                (SignalState::Warmup, vec![Position::Long; n_assets])
            } else if flags.is_valid(i) {
                (SignalState::ValidForecast, median_split(forecasts.row(i)))
            } else {
                debug!("Carrying signal row {} forward to {}", i - 1, i);
                invalid_count += 1;
                (SignalState::InvalidForecastCarry, previous)
            };

            signals.push_row(&row);
            states.push(state);
            previous = row;
        }

        info!("Bad predictions: {}", invalid_count);

        Ok(Codification {
            signals,
            states,
            invalid_count,
        })
    }

    /// Always-long allocation
    pub fn benchmark(n_periods: usize, n_assets: usize) -> BenchmarkMatrix {
        AllocationMatrix::all_long(n_periods, n_assets)
    }
}

/// Long every asset whose forecast is at or above the row median
pub fn median_split(forecast: &[f64]) -> Vec<Position> {
    let median = median(forecast);
    forecast
        .iter()
        .map(|value| {
            if *value >= median {
                Position::Long
            } else {
                Position::Short
            }
        })
        .collect()
}

/// Median with the two middle values averaged for even lengths
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::Position::{Long, Short};
    use super::*;
    use proptest::prelude::*;

    fn forecasts(rows: Vec<Vec<f64>>) -> ForecastMatrix {
        ForecastMatrix::from_rows(rows)
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert!(median(&[]).is_nan());
    }

    #[test]
    fn test_median_split_odd_and_even() {
        assert_eq!(median_split(&[0.3, -0.1, 0.1]), vec![Long, Short, Long]);
        assert_eq!(
            median_split(&[0.4, -0.2, 0.1, 0.0]),
            vec![Long, Short, Long, Short]
        );
    }

    #[test]
    fn test_ties_at_median_go_long() {
        // median is 0.2 and three assets sit on it
        assert_eq!(
            median_split(&[0.2, 0.2, 0.1, 0.2, -0.3]),
            vec![Long, Long, Short, Long, Short]
        );
        assert_eq!(median_split(&[0.0, 0.0, 0.0]), vec![Long, Long, Long]);
    }

    #[test]
    fn test_warmup_rows_are_long() {
        let matrix = forecasts(vec![vec![-1.0, 1.0]; 5]);
        let result = SignalCodifier::codify(&matrix, &ValidityFlags::all_valid(5), 2).unwrap();

        for i in 0..=2 {
            assert_eq!(result.signals.row(i), &[Long, Long]);
            assert_eq!(result.states[i], SignalState::Warmup);
        }
        assert_eq!(result.signals.row(3), &[Short, Long]);
        assert_eq!(result.states[3], SignalState::ValidForecast);
    }

    #[test]
    fn test_invalid_row_carries_previous_signal() {
        let matrix = forecasts(vec![
            vec![0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0],
            vec![0.3, -0.2, 0.1],
            vec![0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0],
            vec![-0.5, 0.4, 0.2],
        ]);
        let flags = ValidityFlags::from_vec(vec![true, true, true, false, false, true]);
        let result = SignalCodifier::codify(&matrix, &flags, 1).unwrap();

        assert_eq!(result.signals.row(2), &[Long, Short, Long]);
        assert_eq!(result.signals.row(3), result.signals.row(2));
        assert_eq!(result.signals.row(4), result.signals.row(2));
        assert_eq!(result.signals.row(5), &[Short, Long, Long]);
        assert_eq!(result.invalid_count, 2);
        assert_eq!(
            result.states,
            vec![
                SignalState::Warmup,
                SignalState::Warmup,
                SignalState::ValidForecast,
                SignalState::InvalidForecastCarry,
                SignalState::InvalidForecastCarry,
                SignalState::ValidForecast,
            ]
        );
    }

    #[test]
    fn test_invalid_right_after_warmup_carries_long() {
        let matrix = forecasts(vec![vec![0.0, 0.0]; 4]);
        let flags = ValidityFlags::from_vec(vec![true, true, false, true]);
        let result = SignalCodifier::codify(&matrix, &flags, 1).unwrap();

        assert_eq!(result.signals.row(2), &[Long, Long]);
        assert_eq!(result.invalid_count, 1);
    }

    #[test]
    fn test_invalid_flags_inside_warmup_are_not_counted() {
        let matrix = forecasts(vec![vec![0.0, 0.0]; 4]);
        let flags = ValidityFlags::from_vec(vec![false, false, true, true]);
        let result = SignalCodifier::codify(&matrix, &flags, 1).unwrap();

        assert_eq!(result.invalid_count, 0);
    }

    #[test]
    fn test_flag_length_mismatch() {
        let matrix = forecasts(vec![vec![0.0, 0.0]; 4]);
        let result = SignalCodifier::codify(&matrix, &ValidityFlags::all_valid(3), 1);
        assert!(matches!(result, Err(BacktestError::ShapeMismatch(_))));
    }

    #[test]
    fn test_benchmark_is_all_long() {
        let bench = SignalCodifier::benchmark(4, 3);
        assert_eq!(bench.n_periods(), 4);
        assert!(bench.rows().all(|row| row.iter().all(|p| *p == Long)));
    }

    proptest! {
        #[test]
        fn prop_codified_rows_follow_state_rules(
            rows in prop::collection::vec(prop::collection::vec(-1.0f64..1.0, 4), 3..30),
            invalid in prop::collection::vec(any::<bool>(), 30),
            lookback in 0usize..3,
        ) {
            let n_periods = rows.len();
            let flags = ValidityFlags::from_vec(invalid[..n_periods].iter().map(|b| !b).collect());
            let matrix = ForecastMatrix::from_rows(rows);
            let result = SignalCodifier::codify(&matrix, &flags, lookback).unwrap();

            prop_assert_eq!(result.signals.n_periods(), n_periods);
            let mut carried = 0;
            for i in 0..n_periods {
                if i <= lookback {
                    prop_assert_eq!(result.signals.row(i), &[Long; 4][..]);
                } else if !flags.is_valid(i) {
                    carried += 1;
                    prop_assert_eq!(result.signals.row(i), result.signals.row(i - 1));
                } else {
                    // at least half of the assets are long
                    let longs = result.signals.row(i).iter().filter(|p| **p == Long).count();
                    prop_assert!(longs >= 2);
                }
            }
            prop_assert_eq!(carried, result.invalid_count);
        }
    }
}
