// =================================================================
// data/types.rs - Return Matrices
// =================================================================

use chrono::NaiveDate;
use serde::Serialize;

use super::DataError;

/// Periodic simple returns, one row per period (oldest first) and one
/// column per asset. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnsMatrix {
    n_periods: usize,
    n_assets: usize,
    values: Vec<f64>,
}

impl ReturnsMatrix {
    /// Build a matrix from chronologically ordered rows
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, DataError> {
        let n_assets = rows.first().map(Vec::len).unwrap_or(0);
        if rows.is_empty() || n_assets == 0 {
            return Err(DataError::Empty);
        }

        let n_periods = rows.len();
        let mut values = Vec::with_capacity(n_periods * n_assets);
        for (row, cells) in rows.into_iter().enumerate() {
            if cells.len() != n_assets {
                return Err(DataError::RaggedRow {
                    row,
                    expected: n_assets,
                    found: cells.len(),
                });
            }
            values.extend(cells);
        }

        Self::from_flat(n_periods, n_assets, values)
    }

    /// Build a matrix from row-major values
    pub fn from_flat(n_periods: usize, n_assets: usize, values: Vec<f64>) -> Result<Self, DataError> {
        if n_periods == 0 || n_assets == 0 {
            return Err(DataError::Empty);
        }
        if values.len() != n_periods * n_assets {
            return Err(DataError::RaggedRow {
                row: values.len() / n_assets,
                expected: n_assets,
                found: values.len() % n_assets,
            });
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(DataError::NonFinite {
                row: pos / n_assets,
                column: pos % n_assets,
            });
        }

        Ok(Self {
            n_periods,
            n_assets,
            values,
        })
    }

    pub fn n_periods(&self) -> usize {
        self.n_periods
    }

    pub fn n_assets(&self) -> usize {
        self.n_assets
    }

    /// Returns of every asset for one period
    pub fn row(&self, index: usize) -> &[f64] {
        let start = index * self.n_assets;
        &self.values[start..start + self.n_assets]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.values.chunks_exact(self.n_assets)
    }

    /// The `lookback + 1` rows ending at `end_index`, or None when the
    /// window would start before the first period or end past the last one.
    pub fn window(&self, end_index: usize, lookback: usize) -> Option<ReturnWindow<'_>> {
        if end_index < lookback || end_index >= self.n_periods {
            return None;
        }

        let start = (end_index - lookback) * self.n_assets;
        let end = (end_index + 1) * self.n_assets;
        Some(ReturnWindow {
            end_index,
            n_assets: self.n_assets,
            values: &self.values[start..end],
        })
    }
}

/// Contiguous trailing slice of a `ReturnsMatrix` used for one model fit
#[derive(Debug, Clone, Copy)]
pub struct ReturnWindow<'a> {
    end_index: usize,
    n_assets: usize,
    values: &'a [f64],
}

impl<'a> ReturnWindow<'a> {
    /// Index of the newest row in the parent matrix
    pub fn end_index(&self) -> usize {
        self.end_index
    }

    /// Number of snapshots (rows) in the window
    pub fn len(&self) -> usize {
        self.values.len() / self.n_assets
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn n_assets(&self) -> usize {
        self.n_assets
    }

    /// Row `offset` of the window, 0 being the oldest
    pub fn row(&self, offset: usize) -> &'a [f64] {
        let start = offset * self.n_assets;
        &self.values[start..start + self.n_assets]
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a [f64]> + 'a {
        let values = self.values;
        values.chunks_exact(self.n_assets)
    }
}

/// Returns matrix together with the labels the caller keeps for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodicReturns {
    pub dates: Vec<NaiveDate>,
    pub symbols: Vec<String>,
    pub returns: ReturnsMatrix,
}

impl PeriodicReturns {
    pub fn new(
        dates: Vec<NaiveDate>,
        symbols: Vec<String>,
        returns: ReturnsMatrix,
    ) -> Result<Self, DataError> {
        if dates.len() != returns.n_periods() {
            return Err(DataError::LabelMismatch(format!(
                "{} dates for {} periods",
                dates.len(),
                returns.n_periods()
            )));
        }
        if symbols.len() != returns.n_assets() {
            return Err(DataError::LabelMismatch(format!(
                "{} symbols for {} assets",
                symbols.len(),
                returns.n_assets()
            )));
        }
        if dates.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(DataError::LabelMismatch(
                "Dates must be strictly increasing".to_string(),
            ));
        }

        Ok(Self {
            dates,
            symbols,
            returns,
        })
    }

    /// Keep only the most recent `periods` rows
    pub fn tail(self, periods: usize) -> Result<Self, DataError> {
        let n_periods = self.returns.n_periods();
        if periods >= n_periods {
            return Ok(self);
        }

        let skip = n_periods - periods;
        let n_assets = self.returns.n_assets();
        let values = self.returns.values[skip * n_assets..].to_vec();
        let returns = ReturnsMatrix::from_flat(periods, n_assets, values)?;
        Self::new(self.dates[skip..].to_vec(), self.symbols, returns)
    }
}
