// rotation-core/src/backtest/engine.rs

use rotation_common::ReturnsMatrix;
use tracing::{info, warn};

use super::forecast::WindowedForecaster;
use super::metrics::MetricsCalculator;
use super::returns::ReturnsEngine;
use super::signals::SignalCodifier;
use super::types::*;
use super::BacktestError;
use crate::model::ForecastModel;

/// Runs forecast -> signals -> returns -> metrics for one model and parameter set
pub struct BacktestEngine<M> {
    model: M,
    config: BacktestConfig,
    metrics_calculator: MetricsCalculator,
}

impl<M: ForecastModel> BacktestEngine<M> {
    pub fn new(model: M, config: BacktestConfig) -> Self {
        let metrics_calculator = MetricsCalculator::new(config.periods_per_year);
        Self {
            model,
            config,
            metrics_calculator,
        }
    }

    pub fn run(&self, returns: &ReturnsMatrix) -> Result<BacktestResult, BacktestError> {
        let BacktestConfig { rank, lookback, .. } = self.config;
        validate_parameters(returns, rank, lookback)?;

        info!(
            "Starting backtest: {} periods x {} assets, rank {}, lookback {}",
            returns.n_periods(),
            returns.n_assets(),
            rank,
            lookback
        );

        let (forecasts, flags) =
            WindowedForecaster::new(&self.model).forecast_all(returns, rank, lookback)?;

        let codification = SignalCodifier::codify(&forecasts, &flags, lookback)?;
        if codification.invalid_count > 0 {
            warn!(
                "{} degenerate forecasts replaced by the previous signal",
                codification.invalid_count
            );
        }
        let benchmark = SignalCodifier::benchmark(returns.n_periods(), returns.n_assets());

        let strategy_series = ReturnsEngine::realize(returns, &codification.signals)?;
        let benchmark_series = ReturnsEngine::realize(returns, &benchmark)?;

        info!("Backtest completed. Calculating metrics...");

        let strategy_sharpe = self
            .metrics_calculator
            .calculate_sharpe_ratio(&strategy_series.returns);
        let benchmark_sharpe = self
            .metrics_calculator
            .calculate_sharpe_ratio(&benchmark_series.returns);
        let strategy_metrics = self.metrics_calculator.calculate(&strategy_series);
        let benchmark_metrics = self.metrics_calculator.calculate(&benchmark_series);

        Ok(BacktestResult {
            model: self.model.name().to_string(),
            config: self.config.clone(),
            strategy_series,
            benchmark_series,
            strategy_sharpe,
            benchmark_sharpe,
            strategy_metrics,
            benchmark_metrics,
            invalid_count: codification.invalid_count,
            signals: codification.signals,
            states: codification.states,
        })
    }
}

/// Check rank and lookback against the matrix shape before any work is done
pub fn validate_parameters(
    returns: &ReturnsMatrix,
    rank: usize,
    lookback: usize,
) -> Result<(), BacktestError> {
    let n_periods = returns.n_periods();
    let n_assets = returns.n_assets();

    if lookback >= n_periods.saturating_sub(1) {
        return Err(BacktestError::Configuration(format!(
            "lookback {} leaves no period to forecast in {} periods",
            lookback, n_periods
        )));
    }
    if rank == 0 || rank > n_assets {
        return Err(BacktestError::Configuration(format!(
            "rank {} must be between 1 and {} assets",
            rank, n_assets
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::testing::{FailingModel, ScriptedModel};
    use crate::model::DmdModel;

    fn config(rank: usize, lookback: usize) -> BacktestConfig {
        BacktestConfig {
            rank,
            lookback,
            periods_per_year: 12,
        }
    }

    fn wave(n_periods: usize, n_assets: usize) -> ReturnsMatrix {
        let rows = (0..n_periods)
            .map(|t| {
                (0..n_assets)
                    .map(|a| 0.02 * ((t as f64) * 0.7 + a as f64).sin() + 0.001 * a as f64)
                    .collect()
            })
            .collect();
        ReturnsMatrix::new(rows).unwrap()
    }

    #[test]
    fn test_rejects_lookback_without_forecast_period() {
        let engine = BacktestEngine::new(ScriptedModel::new(vec![0.0; 2]), config(1, 4));
        let result = engine.run(&wave(5, 2));
        assert!(matches!(result, Err(BacktestError::Configuration(_))));
    }

    #[test]
    fn test_rejects_huge_lookback() {
        let data = wave(10, 3);
        for lookback in [usize::MAX, usize::MAX - 1, 9] {
            let engine = BacktestEngine::new(DmdModel::new(), config(2, lookback));
            assert!(matches!(engine.run(&data), Err(BacktestError::Configuration(_))));
        }
        assert!(validate_parameters(&data, 2, 8).is_ok());
    }

    #[test]
    fn test_rejects_rank_out_of_range() {
        let data = wave(10, 3);
        for rank in [0, 4] {
            let engine = BacktestEngine::new(ScriptedModel::new(vec![0.0; 3]), config(rank, 2));
            assert!(matches!(engine.run(&data), Err(BacktestError::Configuration(_))));
        }
    }

    #[test]
    fn test_model_error_propagates() {
        let engine = BacktestEngine::new(FailingModel { fail_from: 5 }, config(1, 2));
        let err = engine.run(&wave(10, 2)).unwrap_err();
        assert_eq!(err.window_end_index(), Some(5));
    }

    #[test]
    fn test_benchmark_series_is_long_only_mean() {
        let data = wave(12, 3);
        let engine = BacktestEngine::new(ScriptedModel::new(vec![0.1, 0.2, 0.3]), config(2, 4));
        let result = engine.run(&data).unwrap();

        for (t, value) in result.benchmark_series.returns.iter().enumerate() {
            let expected = data.row(t).iter().sum::<f64>() / 3.0;
            assert!((value - expected).abs() < 1e-15);
        }
        assert_eq!(result.invalid_count, 0);
        assert_eq!(result.model, "scripted");
    }

    #[test]
    fn test_dmd_backtest_runs_end_to_end() {
        let data = wave(30, 4);
        let engine = BacktestEngine::new(DmdModel::new(), config(3, 8));
        let result = engine.run(&data).unwrap();

        assert_eq!(result.strategy_series.len(), 30);
        assert_eq!(result.benchmark_series.len(), 30);
        assert!(result.strategy_sharpe.is_finite());
        assert!(result.benchmark_sharpe.is_finite());
        assert!(result
            .states
            .iter()
            .skip(9)
            .all(|s| *s != SignalState::Warmup));
    }
}
