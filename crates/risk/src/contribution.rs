//! Per-asset contributions to portfolio risk.

use factorfolio_primitives::{Symbol, Weights};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::RiskError;

/// Risk share of one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskContribution {
    /// Asset ticker.
    pub ticker: Symbol,
    /// Portfolio weight.
    pub weight: f64,
    /// Share of total portfolio risk.
    pub contribution: f64,
}

/// Marginal contributions `w_i (Σw)_i / (w'Σw)` and portfolio volatility.
///
/// # Errors
/// Returns `RiskError::DimensionMismatch` if `covariance` is not `n × n`, and
/// `RiskError::ZeroVariance` unless `w'Σw > 0`.
pub fn marginal_contribution_to_risk(
    weights: &Array1<f64>,
    covariance: &Array2<f64>,
) -> Result<(Array1<f64>, f64), RiskError> {
    let n = weights.len();
    if covariance.dim() != (n, n) {
        return Err(RiskError::DimensionMismatch {
            weights: n,
            rows: covariance.nrows(),
            cols: covariance.ncols(),
        });
    }

    let sigma_w = covariance.dot(weights);
    let variance = weights.dot(&sigma_w);
    if !(variance > 0.0) || !variance.is_finite() {
        return Err(RiskError::ZeroVariance(variance));
    }
    Ok((weights * &sigma_w / variance, variance.sqrt()))
}

/// Percentage risk contributions, summing to one, in weight order.
///
/// # Errors
/// As [`marginal_contribution_to_risk`].
pub fn risk_contribution(
    weights: &Array1<f64>,
    covariance: &Array2<f64>,
) -> Result<Array1<f64>, RiskError> {
    let (marginal, _) = marginal_contribution_to_risk(weights, covariance)?;
    let total = marginal.sum();
    Ok(marginal / total)
}

/// [`risk_contribution`] keyed by ticker.
///
/// # Errors
/// As [`marginal_contribution_to_risk`].
pub fn risk_contribution_by_ticker(
    weights: &Weights,
    covariance: &Array2<f64>,
) -> Result<Vec<RiskContribution>, RiskError> {
    let shares = risk_contribution(weights.values(), covariance)?;
    Ok(weights
        .iter()
        .zip(shares)
        .map(|((ticker, weight), contribution)| RiskContribution {
            ticker: ticker.clone(),
            weight,
            contribution,
        })
        .collect())
}
