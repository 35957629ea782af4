// =================================================================
// backtest/forecast.rs - Sliding-window forecasts
// =================================================================

use rayon::prelude::*;
use rotation_common::ReturnsMatrix;
use tracing::{debug, info, warn};

use super::{BacktestError, ForecastMatrix, ValidityFlags};
use crate::model::{ForecastModel, ModelError};

/// Drives a `ForecastModel` across every trailing window of a returns matrix
pub struct WindowedForecaster<'m, M> {
    model: &'m M,
}

impl<'m, M: ForecastModel> WindowedForecaster<'m, M> {
    pub fn new(model: &'m M) -> Self {
        Self { model }
    }

    /// Forecast rows `lookback + 1 ..= T - 1` from the windows ending one row
    /// earlier. Rows up to `lookback` stay zero and flagged valid.
    ///
    /// A row the model could not estimate at all is zeroed and flagged
    /// invalid. Single undefined cells in an otherwise usable row are zeroed
    /// without touching the flag.
    pub fn forecast_all(
        &self,
        returns: &ReturnsMatrix,
        rank: usize,
        lookback: usize,
    ) -> Result<(ForecastMatrix, ValidityFlags), BacktestError> {
        let n_periods = returns.n_periods();
        let n_assets = returns.n_assets();

        let mut forecasts = ForecastMatrix::zeros(n_periods, n_assets);
        let mut flags = ValidityFlags::all_valid(n_periods);

        if lookback >= n_periods.saturating_sub(1) {
            return Ok((forecasts, flags));
        }

        info!(
            "Fitting {} on {} windows of {} rows",
            self.model.name(),
            n_periods - 1 - lookback,
            lookback + 1
        );

        // Windows are independent: fit them in parallel, keep results in index order
        let fitted: Vec<(usize, Result<Vec<f64>, ModelError>)> = (lookback..n_periods - 1)
            .into_par_iter()
            .map(|end_index| (end_index, self.forecast_window(returns, end_index, rank, lookback)))
            .collect();

        for (end_index, outcome) in fitted {
            let row = outcome.map_err(|source| BacktestError::ModelFit { end_index, source })?;
            let target = end_index + 1;

            let undefined = row.iter().filter(|v| !v.is_finite()).count();
            if undefined == n_assets {
                warn!("Degenerate forecast for row {}", target);
                flags.mark_invalid(target);
                continue;
            }
            if undefined > 0 {
                debug!("Zeroing {} undefined cells in forecast row {}", undefined, target);
            }

            for (cell, value) in forecasts.row_mut(target).iter_mut().zip(row) {
                *cell = if value.is_finite() { value } else { 0.0 };
            }
        }

        Ok((forecasts, flags))
    }

    fn forecast_window(
        &self,
        returns: &ReturnsMatrix,
        end_index: usize,
        rank: usize,
        lookback: usize,
    ) -> Result<Vec<f64>, ModelError> {
        let window = returns.window(end_index, lookback).ok_or_else(|| {
            ModelError::Numerical(format!("no window of {} rows ends at {}", lookback + 1, end_index))
        })?;

        let state = self.model.fit(&window, rank)?;
        let row = self.model.forecast_one_step(&state);
        debug!("Forecast from window ending at {}", end_index);

        if row.len() != returns.n_assets() {
            return Err(ModelError::ForecastShape {
                expected: returns.n_assets(),
                found: row.len(),
            });
        }
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::testing::{FailingModel, MeanModel, ScriptedModel};

    fn returns(n_periods: usize, n_assets: usize) -> ReturnsMatrix {
        let rows = (0..n_periods)
            .map(|t| (0..n_assets).map(|a| 0.01 * (t as f64 + 1.0) - 0.003 * a as f64).collect())
            .collect();
        ReturnsMatrix::new(rows).unwrap()
    }

    #[test]
    fn test_only_rows_after_lookback_are_forecast() {
        let data = returns(8, 3);
        let model = MeanModel;
        let (forecasts, flags) = WindowedForecaster::new(&model).forecast_all(&data, 1, 3).unwrap();

        assert_eq!(forecasts.n_periods(), 8);
        for i in 0..=3 {
            assert!(forecasts.row(i).iter().all(|v| *v == 0.0));
        }
        // row 4 is the mean of rows 0..=3
        let expected = (0..4).map(|t| data.row(t)[0]).sum::<f64>() / 4.0;
        assert!((forecasts.row(4)[0] - expected).abs() < 1e-12);
        assert_eq!(flags.invalid_rows(), 0);
    }

    #[test]
    fn test_all_nan_row_is_zeroed_and_flagged() {
        let data = returns(6, 2);
        let model = ScriptedModel::new(vec![0.5, -0.5]).with_nan_at(3);
        let (forecasts, flags) = WindowedForecaster::new(&model).forecast_all(&data, 1, 2).unwrap();

        assert!(!flags.is_valid(4));
        assert_eq!(forecasts.row(4), &[0.0, 0.0]);
        assert!(flags.is_valid(3));
        assert!(flags.is_valid(5));
        assert_eq!(forecasts.row(5), &[0.5, -0.5]);
    }

    #[test]
    fn test_partial_nan_row_stays_valid() {
        let data = returns(5, 2);
        let model = ScriptedModel::new(vec![f64::NAN, 0.25]);
        let (forecasts, flags) = WindowedForecaster::new(&model).forecast_all(&data, 1, 2).unwrap();

        assert!(flags.is_valid(3));
        assert_eq!(forecasts.row(3), &[0.0, 0.25]);

        let model = ScriptedModel::new(vec![0.25, f64::INFINITY]);
        let (forecasts, flags) = WindowedForecaster::new(&model).forecast_all(&data, 1, 2).unwrap();

        assert!(flags.is_valid(3));
        assert_eq!(forecasts.row(3), &[0.25, 0.0]);
    }

    #[test]
    fn test_all_infinite_row_is_flagged() {
        let data = returns(5, 2);
        let model = ScriptedModel::new(vec![f64::INFINITY, f64::NEG_INFINITY]);
        let (forecasts, flags) = WindowedForecaster::new(&model).forecast_all(&data, 1, 2).unwrap();

        assert!(!flags.is_valid(3));
        assert!(!flags.is_valid(4));
        assert_eq!(forecasts.row(3), &[0.0, 0.0]);
        assert_eq!(flags.invalid_rows(), 2);
    }

    #[test]
    fn test_model_failure_reports_window_end() {
        let data = returns(10, 2);
        let model = FailingModel { fail_from: 6 };
        let err = WindowedForecaster::new(&model)
            .forecast_all(&data, 1, 2)
            .unwrap_err();

        assert_eq!(err.window_end_index(), Some(6));
    }

    #[test]
    fn test_wrong_forecast_width_is_an_error() {
        let data = returns(5, 3);
        let model = ScriptedModel::new(vec![0.1, 0.2]);
        let err = WindowedForecaster::new(&model)
            .forecast_all(&data, 1, 2)
            .unwrap_err();

        assert!(matches!(
            err,
            BacktestError::ModelFit {
                end_index: 2,
                source: ModelError::ForecastShape { expected: 3, found: 2 }
            }
        ));
    }

    #[test]
    fn test_nothing_to_forecast() {
        let data = returns(3, 2);
        let model = MeanModel;
        let (forecasts, flags) = WindowedForecaster::new(&model).forecast_all(&data, 1, 2).unwrap();

        assert!(forecasts.row(2).iter().all(|v| *v == 0.0));
        assert_eq!(flags.invalid_rows(), 0);

        let (forecasts, flags) = WindowedForecaster::new(&model)
            .forecast_all(&data, 1, usize::MAX)
            .unwrap();
        assert_eq!(forecasts.n_periods(), 3);
        assert_eq!(flags.invalid_rows(), 0);
    }
}
