//! Equal-weight terminal state of the escalation chain.

use factorfolio_math::{TRADING_DAYS, equal_weights, mean, sample_std};
use factorfolio_primitives::PortfolioPerformance;
use ndarray::Array2;

/// Performance of the equal-weight portfolio over cleaned daily returns.
///
/// Volatility is floored at `volatility_floor` when zero or undefined; any
/// non-finite figure is replaced (return 0, volatility the floor, Sharpe 0).
/// Never fails.
#[must_use]
pub fn equal_weight_performance(
    returns: &Array2<f64>,
    risk_free_rate: f64,
    volatility_floor: f64,
) -> PortfolioPerformance {
    let weights = equal_weights(returns.ncols());
    let daily = returns.dot(&weights);

    let annual_return = mean(daily.view()).map_or(0.0, |m| m * TRADING_DAYS);
    let annual_return = if annual_return.is_finite() { annual_return } else { 0.0 };

    let annual_volatility = sample_std(daily.view())
        .map(|s| s * TRADING_DAYS.sqrt())
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(volatility_floor);

    let sharpe_ratio = (annual_return - risk_free_rate) / annual_volatility;
    let sharpe_ratio = if sharpe_ratio.is_finite() { sharpe_ratio } else { 0.0 };

    PortfolioPerformance { annual_return, annual_volatility, sharpe_ratio }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;

    #[test]
    fn matches_manual_computation() {
        let returns = array![[0.01, 0.03], [0.00, -0.02], [0.02, 0.00]];
        let perf = equal_weight_performance(&returns, 0.02, 0.01);

        // daily portfolio returns 0.02, -0.01, 0.01
        let mean: f64 = 0.02 / 3.0;
        let var = ((0.02 - mean).powi(2) + (-0.01 - mean).powi(2) + (0.01 - mean).powi(2)) / 2.0;
        assert_relative_eq!(perf.annual_return, mean * 252.0, epsilon = 1e-12);
        assert_relative_eq!(perf.annual_volatility, var.sqrt() * 252.0_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(
            perf.sharpe_ratio,
            (mean * 252.0 - 0.02) / (var.sqrt() * 252.0_f64.sqrt()),
            epsilon = 1e-9
        );
    }

    #[test]
    fn flat_returns_use_volatility_floor() {
        let returns = array![[0.0, 0.0], [0.0, 0.0]];
        let perf = equal_weight_performance(&returns, 0.02, 0.01);
        assert_eq!(perf.annual_return, 0.0);
        assert_eq!(perf.annual_volatility, 0.01);
        assert_relative_eq!(perf.sharpe_ratio, -2.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_input_is_finite() {
        let perf = equal_weight_performance(&Array2::zeros((0, 3)), 0.02, 0.01);
        assert!(perf.is_finite());
        assert_eq!(perf.annual_return, 0.0);
        assert_eq!(perf.annual_volatility, 0.01);
    }
}
