// provider/traits.rs

use super::ProviderError;
use async_trait::async_trait;
use rotation_common::PeriodicReturns;

/// Source of periodic returns for a basket of symbols
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Returns for `symbols` (in that column order) over at most the last
    /// `periods_back` periods, oldest first, rows with missing data dropped
    async fn get_periodic_returns(
        &self,
        symbols: &[String],
        periods_back: usize,
    ) -> Result<PeriodicReturns, ProviderError>;
}
