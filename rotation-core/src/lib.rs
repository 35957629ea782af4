pub mod backtest;
pub mod config;
pub mod model;
pub mod provider;
pub mod report;

pub use backtest::{BacktestConfig, BacktestEngine, BacktestError, BacktestResult};
pub use model::{DmdModel, ForecastModel, ModelError};
pub use provider::{AlphaVantageProvider, CsvReturnsSource, MarketDataProvider, ProviderError};
