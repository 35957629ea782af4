// =================================================================
// provider/utils.rs - Utility Functions
// =================================================================

use chrono::NaiveDate;
use rotation_common::{PeriodicReturns, ReturnsMatrix};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::{MonthlyAdjustedResponse, ProviderError};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validate and normalise a ticker symbol
pub fn validate_symbol(symbol: &str) -> Result<String, ProviderError> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(ProviderError::InvalidSymbol("Symbol cannot be empty".to_string()));
    }

    // Tickers such as BRK.B or BF-B are allowed
    if !symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ProviderError::InvalidSymbol(format!(
            "Symbol '{}' contains invalid characters",
            symbol
        )));
    }

    if symbol.len() > 12 {
        return Err(ProviderError::InvalidSymbol(format!(
            "Symbol '{}' has invalid length",
            symbol
        )));
    }

    Ok(symbol)
}

/// Extract month-end adjusted closes from an Alpha Vantage payload
pub fn parse_adjusted_closes(
    symbol: &str,
    response: MonthlyAdjustedResponse,
) -> Result<BTreeMap<NaiveDate, f64>, ProviderError> {
    if let Some(message) = response.error_message {
        return Err(ProviderError::ApiError(format!("{}: {}", symbol, message)));
    }
    if let Some(message) = response.note.or(response.information) {
        return Err(ProviderError::RateLimit(message));
    }

    let series = response
        .series
        .ok_or_else(|| ProviderError::ParseError(format!("No monthly series for {}", symbol)))?;

    let mut closes = BTreeMap::new();
    for (raw_date, bar) in series {
        let date = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT)
            .map_err(|e| ProviderError::ParseError(format!("Invalid date '{}': {}", raw_date, e)))?;

        let close = bar.adjusted_close.parse::<f64>().map_err(|e| {
            ProviderError::ParseError(format!(
                "Invalid adjusted close '{}' for {} on {}: {}",
                bar.adjusted_close, symbol, raw_date, e
            ))
        })?;

        if !(close > 0.0) {
            return Err(ProviderError::ParseError(format!(
                "Adjusted close for {} on {} must be positive",
                symbol, raw_date
            )));
        }

        closes.insert(date, close);
    }

    Ok(closes)
}

/// Simple returns between consecutive closes, keyed by the later date
pub fn closes_to_returns(closes: &BTreeMap<NaiveDate, f64>) -> BTreeMap<NaiveDate, f64> {
    closes
        .iter()
        .zip(closes.iter().skip(1))
        .map(|((_, previous), (date, close))| (*date, close / previous - 1.0))
        .collect()
}

/// Join per-symbol returns on date, keep the last `periods_back` dates and
/// drop the ones where any symbol has no value
pub fn align_returns(
    symbols: &[String],
    series: &[BTreeMap<NaiveDate, f64>],
    periods_back: usize,
) -> Result<PeriodicReturns, ProviderError> {
    if symbols.len() != series.len() {
        return Err(ProviderError::ParseError(format!(
            "{} symbols but {} return series",
            symbols.len(),
            series.len()
        )));
    }

    let all_dates: BTreeSet<NaiveDate> = series.iter().flat_map(|s| s.keys().copied()).collect();
    let skip = all_dates.len().saturating_sub(periods_back);

    let mut dates = Vec::new();
    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for date in all_dates.into_iter().skip(skip) {
        let row: Option<Vec<f64>> = series.iter().map(|s| s.get(&date).copied()).collect();
        match row {
            Some(row) => {
                dates.push(date);
                rows.push(row);
            }
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!("Dropped {} periods with missing data", dropped);
    }

    let returns = ReturnsMatrix::new(rows)?;
    Ok(PeriodicReturns::new(dates, symbols.to_vec(), returns)?)
}
