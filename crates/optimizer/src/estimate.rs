//! Expected-return and covariance estimation.

use factorfolio_math::{
    TRADING_DAYS, is_finite_matrix, mean, sample_covariance, sample_std, symmetrize,
};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::OptimizerConfig;

/// Annualized expected-return estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnEstimator {
    /// Geometric: `(Π(1 + r))^(252 / n) − 1`.
    #[default]
    Compounded,
    /// Arithmetic: `mean(r) × 252`.
    Arithmetic,
}

/// Per-asset annualized expected returns of a cleaned `(days × assets)` matrix.
///
/// Non-finite estimates are replaced with 0.0.
#[must_use]
pub fn expected_returns(returns: &Array2<f64>, estimator: ReturnEstimator) -> Array1<f64> {
    let n = returns.nrows() as f64;
    let raw: Array1<f64> = returns
        .axis_iter(Axis(1))
        .map(|column| match estimator {
            ReturnEstimator::Compounded => {
                let growth: f64 = column.iter().map(|r| 1.0 + r).product();
                growth.powf(TRADING_DAYS / n) - 1.0
            }
            ReturnEstimator::Arithmetic => mean(column).map_or(f64::NAN, |m| m * TRADING_DAYS),
        })
        .collect();

    let non_finite = raw.iter().filter(|v| !v.is_finite()).count();
    if non_finite > 0 {
        warn!(assets = non_finite, "expected returns contain NaN or infinity, replacing with 0");
    }
    raw.mapv(|v| if v.is_finite() { v } else { 0.0 })
}

/// Annualized sample covariance plus `regularization · I`, symmetrized.
///
/// A non-finite result is replaced by a diagonal matrix of annualized
/// variances over the finite values of each asset, undefined variances set to
/// `diagonal_fill` and all floored at `diagonal_floor`.
#[must_use]
pub fn regularized_covariance(returns: &Array2<f64>, config: &OptimizerConfig) -> Array2<f64> {
    let n = returns.ncols();
    let raw = sample_covariance(returns.view())
        .unwrap_or_else(|_| Array2::from_elem((n, n), f64::NAN));
    let regularized = raw * TRADING_DAYS + Array2::<f64>::eye(n) * config.regularization;
    let covariance = symmetrize(&regularized);

    if is_finite_matrix(&covariance) {
        return covariance;
    }

    warn!(assets = n, "covariance matrix has NaN or infinity, using diagonal matrix");
    let variances: Array1<f64> = returns
        .axis_iter(Axis(1))
        .map(|column| {
            let finite: Array1<f64> = column.iter().copied().filter(|v| v.is_finite()).collect();
            let var = sample_std(finite.view()).map_or(f64::NAN, |s| s * s * TRADING_DAYS);
            let var = if var.is_nan() { config.diagonal_fill } else { var };
            var.max(config.diagonal_floor)
        })
        .collect();
    Array2::from_diag(&variances)
}
