pub mod data;

pub use data::{
    read_returns, read_returns_csv, write_returns, write_returns_csv, DataError, PeriodicReturns,
    ReturnWindow, ReturnsMatrix,
};
