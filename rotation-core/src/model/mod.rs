// model/mod.rs
pub mod dmd;

use rotation_common::ReturnWindow;
use thiserror::Error;

pub use dmd::{DmdModel, DmdState};

/// Error types for model fitting
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid rank: {0}")]
    InvalidRank(usize),

    #[error("SVD did not converge after {0} iterations")]
    SvdNotConverged(usize),

    #[error("Forecast has {found} values, expected {expected}")]
    ForecastShape { expected: usize, found: usize },

    #[error("Numerical error: {0}")]
    Numerical(String),
}

/// One-step-ahead forecasting capability consumed by the backtest.
///
/// `fit` builds an independent state from a single window, so one model
/// value can serve every window concurrently. A forecast made of NaN values
/// means the model could not produce an estimate for that window.
pub trait ForecastModel: Send + Sync {
    /// Fitted state for one window
    type State;

    fn name(&self) -> &str;

    /// Fit on a window whose rows are snapshots, oldest first
    fn fit(&self, window: &ReturnWindow<'_>, rank: usize) -> Result<Self::State, ModelError>;

    /// Estimate the row that follows the fitted window
    fn forecast_one_step(&self, state: &Self::State) -> Vec<f64>;
}
