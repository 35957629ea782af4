// =================================================================
// backtest/returns.rs - Realized portfolio returns
// =================================================================

use rotation_common::ReturnsMatrix;

use super::{AllocationMatrix, BacktestError, PortfolioReturnSeries};

/// Combines realized returns with an allocation
pub struct ReturnsEngine;

impl ReturnsEngine {
    /// Equal-weight signed return per period and its compounded growth
    pub fn realize(
        returns: &ReturnsMatrix,
        allocation: &AllocationMatrix,
    ) -> Result<PortfolioReturnSeries, BacktestError> {
        if returns.n_periods() != allocation.n_periods() || returns.n_assets() != allocation.n_assets() {
            return Err(BacktestError::ShapeMismatch(format!(
                "returns are {}x{}, allocation is {}x{}",
                returns.n_periods(),
                returns.n_assets(),
                allocation.n_periods(),
                allocation.n_assets()
            )));
        }

        let n_assets = returns.n_assets() as f64;
        let period_returns: Vec<f64> = returns
            .rows()
            .zip(allocation.rows())
            .map(|(realized, positions)| {
                realized
                    .iter()
                    .zip(positions)
                    .map(|(r, p)| r * p.weight())
                    .sum::<f64>()
                    / n_assets
            })
            .collect();

        let cumulative = cumulative_returns(&period_returns);
        Ok(PortfolioReturnSeries {
            returns: period_returns,
            cumulative,
        })
    }
}

/// `exp(sum(ln(1 + r)))` up to each period. Assumes every return is above -1.
pub fn cumulative_returns(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(0.0, |log_growth, r| {
            *log_growth += r.ln_1p();
            Some(log_growth.exp())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::SignalCodifier;
    use proptest::prelude::*;

    #[test]
    fn test_single_period_growth() {
        let x = 0.037;
        let cum = cumulative_returns(&[x]);
        assert!((cum[0] - (1.0 + x)).abs() < 1e-15);
    }

    #[test]
    fn test_compounding() {
        let cum = cumulative_returns(&[0.1, -0.1, 0.2]);
        assert!((cum[1] - 1.1 * 0.9).abs() < 1e-12);
        assert!((cum[2] - 1.1 * 0.9 * 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_signed_mean_per_period() {
        let returns = ReturnsMatrix::new(vec![vec![0.02, -0.04], vec![0.06, 0.02]]).unwrap();
        let bench = SignalCodifier::benchmark(2, 2);
        let series = ReturnsEngine::realize(&returns, &bench).unwrap();

        assert!((series.returns[0] - (-0.01)).abs() < 1e-15);
        assert!((series.returns[1] - 0.04).abs() < 1e-15);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_shape_mismatch() {
        let returns = ReturnsMatrix::new(vec![vec![0.02, -0.04]]).unwrap();
        let bench = SignalCodifier::benchmark(2, 2);
        assert!(matches!(
            ReturnsEngine::realize(&returns, &bench),
            Err(BacktestError::ShapeMismatch(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_cumulative_matches_running_product(returns in prop::collection::vec(-0.5f64..0.5, 1..40)) {
            let cum = cumulative_returns(&returns);
            let mut product = 1.0;
            for (r, c) in returns.iter().zip(&cum) {
                product *= 1.0 + r;
                prop_assert!((c - product).abs() <= 1e-9 * product.max(1.0));
            }
        }
    }
}
