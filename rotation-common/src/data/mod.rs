// data/mod.rs
pub mod types;
pub mod errors;
pub mod csv_file;

// Re-export main data types for easy access
pub use types::*;
pub use errors::DataError;
pub use csv_file::{read_returns, read_returns_csv, write_returns, write_returns_csv};
