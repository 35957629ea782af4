// provider/csv_source.rs

use async_trait::async_trait;
use rotation_common::{read_returns_csv, PeriodicReturns, ReturnsMatrix};
use std::path::PathBuf;
use tracing::info;

use super::{traits::MarketDataProvider, utils::validate_symbol, ProviderError};

/// Returns previously saved with `write_returns_csv`
pub struct CsvReturnsSource {
    path: PathBuf,
}

impl CsvReturnsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Every symbol in the file
    pub fn load_all(&self) -> Result<PeriodicReturns, ProviderError> {
        Ok(read_returns_csv(&self.path)?)
    }
}

#[async_trait]
impl MarketDataProvider for CsvReturnsSource {
    async fn get_periodic_returns(
        &self,
        symbols: &[String],
        periods_back: usize,
    ) -> Result<PeriodicReturns, ProviderError> {
        let data = self.load_all()?;
        if symbols.is_empty() {
            return Ok(data.tail(periods_back)?);
        }

        let mut columns = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let symbol = validate_symbol(symbol)?;
            let column = data
                .symbols
                .iter()
                .position(|s| s.eq_ignore_ascii_case(&symbol))
                .ok_or_else(|| {
                    ProviderError::InvalidSymbol(format!(
                        "{} not found in {}",
                        symbol,
                        self.path.display()
                    ))
                })?;
            columns.push(column);
        }

        let rows: Vec<Vec<f64>> = data
            .returns
            .rows()
            .map(|row| columns.iter().map(|&c| row[c]).collect())
            .collect();
        let selected_symbols: Vec<String> = columns.iter().map(|&c| data.symbols[c].clone()).collect();
        let selected = PeriodicReturns::new(data.dates, selected_symbols, ReturnsMatrix::new(rows)?)?;

        info!(
            "Selected {} of {} symbols from {}",
            columns.len(),
            data.symbols.len(),
            self.path.display()
        );
        Ok(selected.tail(periods_back)?)
    }
}
