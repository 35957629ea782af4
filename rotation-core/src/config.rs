use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

use crate::backtest::BacktestConfig;

const DEFAULT_SYMBOLS: [&str; 9] = ["XLY", "XLP", "XLE", "XLF", "XLV", "XLI", "XLB", "XLK", "XLU"];

#[derive(Debug, Clone, Deserialize)]
pub struct Backtest {
    pub rank: usize,
    pub lookback: usize,
    pub periods_per_year: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Provider {
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub symbols: Vec<String>,
    pub periods_back: usize,
    pub calls_per_minute: u32,
    pub throttle_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub backtest: Backtest,
    pub provider: Provider,
}

impl Settings {
    /// Defaults, then `config/{RUN_MODE}`, then `ROTATION__*` variables.
    /// Call `validate` once any command line overrides are applied.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        Self::load(&format!("config/{}", run_mode))
    }

    pub fn load(file: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("backtest.rank", 9_i64)?
            .set_default("backtest.lookback", 14_i64)?
            .set_default("backtest.periods_per_year", 12_i64)?
            .set_default("provider.symbols", DEFAULT_SYMBOLS.to_vec())?
            .set_default("provider.periods_back", 240_i64)?
            .set_default("provider.calls_per_minute", 5_i64)?
            .set_default("provider.throttle_secs", 60_i64)?
            .set_default("provider.max_retries", 2_i64)?
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix("ROTATION").separator("__"));

        if let Ok(api_key) = std::env::var("ALPHAVANTAGE_API_KEY") {
            builder = builder.set_override("provider.api_key", api_key)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Reject values no run could use
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backtest.rank == 0 {
            return Err(ConfigError::Message("backtest.rank must be at least 1".into()));
        }
        if self.backtest.periods_per_year == 0 {
            return Err(ConfigError::Message(
                "backtest.periods_per_year must be at least 1".into(),
            ));
        }
        if self.provider.symbols.is_empty() {
            return Err(ConfigError::Message("provider.symbols cannot be empty".into()));
        }
        if self.provider.periods_back <= self.backtest.lookback.saturating_add(1) {
            return Err(ConfigError::Message(format!(
                "provider.periods_back ({}) must exceed backtest.lookback + 1 ({})",
                self.provider.periods_back,
                self.backtest.lookback.saturating_add(1)
            )));
        }
        Ok(())
    }

    pub fn backtest_config(&self) -> BacktestConfig {
        BacktestConfig {
            rank: self.backtest.rank,
            lookback: self.backtest.lookback,
            periods_per_year: self.backtest.periods_per_year,
        }
    }
}
