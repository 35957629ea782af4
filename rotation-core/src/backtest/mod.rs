pub mod engine;
pub mod errors;
pub mod forecast;
pub mod metrics;
pub mod returns;
pub mod signals;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{validate_parameters, BacktestEngine};
pub use errors::BacktestError;
pub use forecast::WindowedForecaster;
pub use metrics::{sharpe, MetricsCalculator};
pub use returns::{cumulative_returns, ReturnsEngine};
pub use signals::{median, median_split, SignalCodifier};
pub use types::*;
