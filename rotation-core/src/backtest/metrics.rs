// rotation-core/src/backtest/metrics.rs

use super::types::*;

pub struct MetricsCalculator {
    periods_per_year: u32, // annualisation factor, 12 for monthly data
}

impl MetricsCalculator {
    pub fn new(periods_per_year: u32) -> Self {
        Self { periods_per_year }
    }

    pub fn calculate(&self, series: &PortfolioReturnSeries) -> PerformanceSummary {
        PerformanceSummary {
            total_return: self.calculate_total_return(series),
            sortino_ratio: self.calculate_sortino_ratio(&series.returns),
            max_drawdown: self.calculate_drawdown(&series.cumulative),
        }
    }

    /// mean / sample stdev * sqrt(periods per year). A constant series gives
    /// the raw quotient (+-inf, or NaN when the mean is zero) instead of an error.
    pub fn calculate_sharpe_ratio(&self, returns: &[f64]) -> f64 {
        sharpe(returns, self.periods_per_year)
    }

    fn calculate_sortino_ratio(&self, returns: &[f64]) -> f64 {
        if returns.is_empty() {
            return f64::NAN;
        }

        let n = returns.len() as f64;
        let mean_return = returns.iter().sum::<f64>() / n;
        let downside_deviation = (returns
            .iter()
            .map(|r| r.min(0.0).powi(2))
            .sum::<f64>()
            / n)
            .sqrt();

        mean_return / downside_deviation * f64::from(self.periods_per_year).sqrt()
    }

    // largest peak-to-trough fall of the growth curve, starting from 1.0
    fn calculate_drawdown(&self, cumulative: &[f64]) -> f64 {
        let mut peak = 1.0_f64;
        let mut max_drawdown = 0.0_f64;

        for value in cumulative {
            if *value > peak {
                peak = *value;
            } else if peak > 0.0 {
                max_drawdown = max_drawdown.max((peak - value) / peak);
            }
        }

        max_drawdown
    }

    fn calculate_total_return(&self, series: &PortfolioReturnSeries) -> f64 {
        series.final_cumulative().map_or(0.0, |growth| growth - 1.0)
    }
}

/// Annualised Sharpe ratio of a periodic return series
pub fn sharpe(returns: &[f64], periods_per_year: u32) -> f64 {
    if returns.len() < 2 {
        return f64::NAN;
    }

    let n = returns.len() as f64;
    let mean_return = returns.iter().sum::<f64>() / n;
    let variance = returns
        .iter()
        .map(|r| (r - mean_return).powi(2))
        .sum::<f64>()
        / (n - 1.0);

    mean_return / variance.sqrt() * f64::from(periods_per_year).sqrt()
}
