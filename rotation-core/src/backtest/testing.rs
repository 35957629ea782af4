// Deterministic models for unit tests

use rotation_common::ReturnWindow;

use crate::model::{ForecastModel, ModelError};

/// Forecasts the column means of the window
pub struct MeanModel;

impl ForecastModel for MeanModel {
    type State = Vec<f64>;

    fn name(&self) -> &str {
        "mean"
    }

    fn fit(&self, window: &ReturnWindow<'_>, _rank: usize) -> Result<Vec<f64>, ModelError> {
        let mut sums = vec![0.0; window.n_assets()];
        for row in window.rows() {
            for (sum, value) in sums.iter_mut().zip(row) {
                *sum += value;
            }
        }
        let n = window.len() as f64;
        Ok(sums.into_iter().map(|s| s / n).collect())
    }

    fn forecast_one_step(&self, state: &Vec<f64>) -> Vec<f64> {
        state.clone()
    }
}

/// Returns a fixed row, or all NaN for the listed window end indices
pub struct ScriptedModel {
    row: Vec<f64>,
    nan_at: Vec<usize>,
}

impl ScriptedModel {
    pub fn new(row: Vec<f64>) -> Self {
        Self {
            row,
            nan_at: Vec::new(),
        }
    }

    pub fn with_nan_at(mut self, end_index: usize) -> Self {
        self.nan_at.push(end_index);
        self
    }
}

impl ForecastModel for ScriptedModel {
    type State = usize;

    fn name(&self) -> &str {
        "scripted"
    }

    fn fit(&self, window: &ReturnWindow<'_>, _rank: usize) -> Result<usize, ModelError> {
        Ok(window.end_index())
    }

    fn forecast_one_step(&self, end_index: &usize) -> Vec<f64> {
        if self.nan_at.contains(end_index) {
            vec![f64::NAN; self.row.len()]
        } else {
            self.row.clone()
        }
    }
}

/// Fails on every window ending at or after `fail_from`
pub struct FailingModel {
    pub fail_from: usize,
}

impl ForecastModel for FailingModel {
    type State = usize;

    fn name(&self) -> &str {
        "failing"
    }

    fn fit(&self, window: &ReturnWindow<'_>, _rank: usize) -> Result<usize, ModelError> {
        if window.end_index() >= self.fail_from {
            return Err(ModelError::Numerical("singular system".to_string()));
        }
        Ok(window.n_assets())
    }

    fn forecast_one_step(&self, n_assets: &usize) -> Vec<f64> {
        vec![0.1; *n_assets]
    }
}
