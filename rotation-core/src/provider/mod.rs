// provider/mod.rs
pub mod traits;
pub mod types;
pub mod errors;
pub mod alpha_vantage;
pub mod csv_source;
pub mod utils;

// Re-export main interfaces for easy access
pub use traits::MarketDataProvider;
pub use types::*;
pub use errors::ProviderError;
pub use alpha_vantage::AlphaVantageProvider;
pub use csv_source::CsvReturnsSource;
