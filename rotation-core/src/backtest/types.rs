// rotation-core/src/backtest/types.rs

use serde::{Deserialize, Serialize};

// Backtest parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub rank: usize,             // model complexity bound, 1..=assets
    pub lookback: usize,         // window holds lookback + 1 rows
    pub periods_per_year: u32,   // Sharpe annualisation (12 = monthly)
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            rank: 9,
            lookback: 14,
            periods_per_year: 12,
        }
    }
}

// Allocation of one asset in one period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    Long,
    Short,
}

impl Position {
    pub fn weight(self) -> f64 {
        match self {
            Position::Long => 1.0,
            Position::Short => -1.0,
        }
    }
}

// Periods x assets grid of positions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationMatrix {
    n_assets: usize,
    cells: Vec<Position>,
}

pub type SignalMatrix = AllocationMatrix;
pub type BenchmarkMatrix = AllocationMatrix;

impl AllocationMatrix {
    pub(crate) fn with_capacity(n_periods: usize, n_assets: usize) -> Self {
        Self {
            n_assets,
            cells: Vec::with_capacity(n_periods * n_assets),
        }
    }

    /// Every asset long in every period
    pub fn all_long(n_periods: usize, n_assets: usize) -> Self {
        Self {
            n_assets,
            cells: vec![Position::Long; n_periods * n_assets],
        }
    }

    pub(crate) fn push_row(&mut self, row: &[Position]) {
        debug_assert_eq!(row.len(), self.n_assets);
        self.cells.extend_from_slice(row);
    }

    pub fn n_periods(&self) -> usize {
        if self.n_assets == 0 {
            0
        } else {
            self.cells.len() / self.n_assets
        }
    }

    pub fn n_assets(&self) -> usize {
        self.n_assets
    }

    pub fn row(&self, index: usize) -> &[Position] {
        let start = index * self.n_assets;
        &self.cells[start..start + self.n_assets]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Position]> + '_ {
        self.cells.chunks_exact(self.n_assets.max(1))
    }
}

// Raw one-step-ahead forecasts aligned with the returns matrix
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastMatrix {
    n_assets: usize,
    values: Vec<f64>,
}

impl ForecastMatrix {
    pub(crate) fn zeros(n_periods: usize, n_assets: usize) -> Self {
        Self {
            n_assets,
            values: vec![0.0; n_periods * n_assets],
        }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        let n_assets = rows.first().map(Vec::len).unwrap_or(0);
        Self {
            n_assets,
            values: rows.into_iter().flatten().collect(),
        }
    }

    pub fn n_periods(&self) -> usize {
        if self.n_assets == 0 {
            0
        } else {
            self.values.len() / self.n_assets
        }
    }

    pub fn n_assets(&self) -> usize {
        self.n_assets
    }

    pub fn row(&self, index: usize) -> &[f64] {
        let start = index * self.n_assets;
        &self.values[start..start + self.n_assets]
    }

    pub(crate) fn row_mut(&mut self, index: usize) -> &mut [f64] {
        let start = index * self.n_assets;
        &mut self.values[start..start + self.n_assets]
    }
}

// Per-row flag: false when the model produced nothing usable for the row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityFlags(Vec<bool>);

impl ValidityFlags {
    pub fn all_valid(n_periods: usize) -> Self {
        Self(vec![true; n_periods])
    }

    pub fn from_vec(flags: Vec<bool>) -> Self {
        Self(flags)
    }

    pub fn is_valid(&self, index: usize) -> bool {
        self.0[index]
    }

    pub(crate) fn mark_invalid(&mut self, index: usize) {
        self.0[index] = false;
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn invalid_rows(&self) -> usize {
        self.0.iter().filter(|valid| !**valid).count()
    }
}

// How a signal row was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignalState {
    Warmup,
    ValidForecast,
    InvalidForecastCarry,
}

// Output of the signal codifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Codification {
    pub signals: SignalMatrix,
    pub states: Vec<SignalState>,
    pub invalid_count: usize,
}

// Per-period portfolio returns and their compounded growth
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioReturnSeries {
    pub returns: Vec<f64>,
    pub cumulative: Vec<f64>,
}

impl PortfolioReturnSeries {
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    /// Growth of one unit over the whole series
    pub fn final_cumulative(&self) -> Option<f64> {
        self.cumulative.last().copied()
    }
}

// Secondary statistics reported next to the Sharpe ratio
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub total_return: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
}

// Backtest result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub model: String,
    pub config: BacktestConfig,
    pub strategy_series: PortfolioReturnSeries,
    pub benchmark_series: PortfolioReturnSeries,
    pub strategy_sharpe: f64,
    pub benchmark_sharpe: f64,
    pub strategy_metrics: PerformanceSummary,
    pub benchmark_metrics: PerformanceSummary,
    pub invalid_count: usize,
    pub signals: SignalMatrix,
    pub states: Vec<SignalState>,
}
