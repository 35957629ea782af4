// =================================================================
// model/dmd.rs - Dynamic Mode Decomposition forecaster
// =================================================================

use nalgebra::{DMatrix, DVector};
use rotation_common::ReturnWindow;
use tracing::debug;

use super::{ForecastModel, ModelError};

const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Rank-truncated DMD over the snapshots of a return window.
///
/// Assets are the state dimension and window rows the snapshots. The linear
/// operator is estimated in the span of the leading left singular vectors of
/// the snapshot matrix, and the forecast is the reconstruction propagated from
/// the first snapshot to one step past the window.
#[derive(Debug, Clone)]
pub struct DmdModel {
    svd_eps: f64,
    max_iterations: usize,
}

impl DmdModel {
    pub fn new() -> Self {
        Self {
            svd_eps: f64::EPSILON,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl Default for DmdModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Fitted reduced-order dynamics for one window
#[derive(Debug, Clone)]
pub enum DmdState {
    Fitted {
        /// Truncated left singular vectors (assets x rank)
        basis: DMatrix<f64>,
        /// Reduced operator (rank x rank)
        operator: DMatrix<f64>,
        /// First snapshot projected onto the basis
        initial: DVector<f64>,
        /// Steps from the first snapshot to the forecast
        horizon: usize,
    },
    /// Nothing to learn from the window (too short or all zero)
    Degenerate { n_assets: usize },
}

impl ForecastModel for DmdModel {
    type State = DmdState;

    fn name(&self) -> &str {
        "dmd"
    }

    fn fit(&self, window: &ReturnWindow<'_>, rank: usize) -> Result<DmdState, ModelError> {
        let n_assets = window.n_assets();
        let snapshots = window.len();
        if rank == 0 {
            return Err(ModelError::InvalidRank(rank));
        }
        if snapshots < 2 {
            return Ok(DmdState::Degenerate { n_assets });
        }

        let data = DMatrix::from_fn(n_assets, snapshots, |asset, t| window.row(t)[asset]);
        let x = data.columns(0, snapshots - 1).clone_owned();
        let y = data.columns(1, snapshots - 1).clone_owned();

        let svd = x
            .try_svd(true, true, self.svd_eps, self.max_iterations)
            .ok_or(ModelError::SvdNotConverged(self.max_iterations))?;
        let u = svd
            .u
            .ok_or_else(|| ModelError::Numerical("left singular vectors missing".to_string()))?;
        let v_t = svd
            .v_t
            .ok_or_else(|| ModelError::Numerical("right singular vectors missing".to_string()))?;
        let sigma = svd.singular_values;

        // descending singular values
        let mut order: Vec<usize> = (0..sigma.len()).collect();
        order.sort_by(|&a, &b| sigma[b].total_cmp(&sigma[a]));

        let leading = sigma[order[0]];
        if !(leading > 0.0) {
            debug!("Window ending at {} has no energy", window.end_index());
            return Ok(DmdState::Degenerate { n_assets });
        }

        // never keep directions below numerical precision
        let tolerance = leading * f64::EPSILON * n_assets.max(snapshots - 1) as f64;
        let kept: Vec<usize> = order
            .iter()
            .copied()
            .take(rank)
            .take_while(|&i| sigma[i] > tolerance)
            .collect();
        let r = kept.len();

        let basis = DMatrix::from_fn(n_assets, r, |row, c| u[(row, kept[c])]);
        let v_r = DMatrix::from_fn(snapshots - 1, r, |row, c| v_t[(kept[c], row)]);
        let sigma_inv = DMatrix::from_diagonal(&DVector::from_iterator(
            r,
            kept.iter().map(|&i| 1.0 / sigma[i]),
        ));

        let operator = basis.transpose() * &y * v_r * sigma_inv;
        let initial = basis.transpose() * data.column(0);

        Ok(DmdState::Fitted {
            basis,
            operator,
            initial,
            horizon: snapshots,
        })
    }

    fn forecast_one_step(&self, state: &DmdState) -> Vec<f64> {
        match state {
            DmdState::Fitted {
                basis,
                operator,
                initial,
                horizon,
            } => {
                let mut reduced = initial.clone();
                for _ in 0..*horizon {
                    reduced = operator * reduced;
                }
                (basis * reduced).iter().copied().collect()
            }
            DmdState::Degenerate { n_assets } => vec![f64::NAN; *n_assets],
        }
    }
}
