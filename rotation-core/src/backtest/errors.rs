use rotation_common::DataError;
use thiserror::Error;

use crate::model::ModelError;

/// Backtest error types
#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Model fit failed on window ending at row {end_index}: {source}")]
    ModelFit {
        end_index: usize,
        source: ModelError,
    },

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Data error: {0}")]
    Data(#[from] DataError),
}

impl BacktestError {
    /// Row index of the window that failed, for model errors
    pub fn window_end_index(&self) -> Option<usize> {
        match self {
            BacktestError::ModelFit { end_index, .. } => Some(*end_index),
            _ => None,
        }
    }
}
