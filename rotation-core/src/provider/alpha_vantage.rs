// =================================================================
// provider/alpha_vantage.rs - Alpha Vantage Implementation
// =================================================================

use async_trait::async_trait;
use chrono::NaiveDate;
use rotation_common::PeriodicReturns;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::{
    traits::MarketDataProvider,
    types::MonthlyAdjustedResponse,
    utils::{align_returns, closes_to_returns, parse_adjusted_closes, validate_symbol},
    ProviderError,
};

// Constants
const ALPHA_VANTAGE_API_URL: &str = "https://www.alphavantage.co/query";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CALLS_PER_MINUTE: u32 = 5;
const DEFAULT_THROTTLE: Duration = Duration::from_secs(60);
const DEFAULT_MAX_RETRIES: u32 = 2;

/// Monthly adjusted returns from the Alpha Vantage REST API
pub struct AlphaVantageProvider {
    api_url: String,
    api_key: String,
    client: reqwest::Client,
    calls_per_minute: u32,
    throttle: Duration,
    max_retries: u32,
}

impl AlphaVantageProvider {
    /// Create a provider with the free-tier rate limit
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_url: ALPHA_VANTAGE_API_URL.to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
            calls_per_minute: DEFAULT_CALLS_PER_MINUTE,
            throttle: DEFAULT_THROTTLE,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Pause for `throttle` after every `calls_per_minute` requests
    pub fn with_rate_limit(mut self, calls_per_minute: u32, throttle: Duration) -> Self {
        self.calls_per_minute = calls_per_minute.max(1);
        self.throttle = throttle;
        self
    }

    /// Retries per symbol after a rate-limit, timeout or network failure
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Number of pauses a fetch of `symbols` symbols will take
    pub fn pauses_for(&self, symbols: usize) -> usize {
        symbols.saturating_sub(1) / self.calls_per_minute as usize
    }

    /// Fetch one symbol, waiting `throttle` before each retry of a recoverable failure
    async fn fetch_with_retry(&self, symbol: &str) -> Result<BTreeMap<NaiveDate, f64>, ProviderError> {
        let mut attempt = 0;

        loop {
            match self.fetch_adjusted_closes(symbol).await {
                Ok(closes) => return Ok(closes),
                Err(e) if e.is_recoverable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "Request for {} failed (attempt {}/{}): {}. Retrying in {:?}",
                        symbol,
                        attempt,
                        self.max_retries.saturating_add(1),
                        e,
                        self.throttle
                    );
                    sleep(self.throttle).await;
                }
                Err(e) => {
                    if attempt > 0 {
                        error!("Giving up on {} after {} attempts: {}", symbol, attempt + 1, e);
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Fetch month-end adjusted closes for one symbol
    async fn fetch_adjusted_closes(
        &self,
        symbol: &str,
    ) -> Result<BTreeMap<NaiveDate, f64>, ProviderError> {
        debug!("Fetching monthly adjusted series for {}", symbol);

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("function", "TIME_SERIES_MONTHLY_ADJUSTED"),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::ApiError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        let payload: MonthlyAdjustedResponse = serde_json::from_str(&body)?;
        parse_adjusted_closes(symbol, payload)
    }
}

#[async_trait]
impl MarketDataProvider for AlphaVantageProvider {
    async fn get_periodic_returns(
        &self,
        symbols: &[String],
        periods_back: usize,
    ) -> Result<PeriodicReturns, ProviderError> {
        if symbols.is_empty() {
            return Err(ProviderError::InvalidSymbol("No symbols provided".to_string()));
        }
        let symbols = symbols
            .iter()
            .map(|s| validate_symbol(s))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "Querying {} securities, estimated time: {:?}",
            symbols.len(),
            self.throttle * self.pauses_for(symbols.len()) as u32
        );

        let mut series = Vec::with_capacity(symbols.len());
        for (index, symbol) in symbols.iter().enumerate() {
            if index > 0 && index % self.calls_per_minute as usize == 0 {
                warn!(
                    "Rate limit of {} calls reached, waiting {:?}",
                    self.calls_per_minute, self.throttle
                );
                sleep(self.throttle).await;
            }

            let closes = self.fetch_with_retry(symbol).await?;
            series.push(closes_to_returns(&closes));
        }

        let aligned = align_returns(&symbols, &series, periods_back)?;
        info!(
            "Successfully fetched {} periods for {} symbols",
            aligned.returns.n_periods(),
            aligned.symbols.len()
        );
        Ok(aligned)
    }
}
