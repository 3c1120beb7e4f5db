//! Robust allocation: cleaning, estimation, solver escalation and fallback.

use factorfolio_primitives::{
    AllocationSource, OptimizationMethod, OptimizationResult, ReturnMatrix, Weights,
};
use factorfolio_traits::{MeanVarianceProblem, Objective};
use ndarray::{Array1, Array2};
use tracing::{debug, warn};

use crate::{
    OptimizeError, OptimizerConfig, SolverChain, equal_weight_performance, expected_returns,
    regularized_covariance,
};

/// Cleaned returns with their estimates.
pub(crate) struct Estimates {
    pub(crate) cleaned: ReturnMatrix,
    pub(crate) mu: Array1<f64>,
    pub(crate) covariance: Array2<f64>,
}

/// Mean-variance optimizer with a solver chain and equal-weight fallback.
#[derive(Debug, Default)]
pub struct PortfolioOptimizer {
    config: OptimizerConfig,
    chain: SolverChain,
}

impl PortfolioOptimizer {
    /// Create an optimizer with default configuration and solver order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an optimizer with custom configuration.
    #[must_use]
    pub fn with_config(config: OptimizerConfig) -> Self {
        Self { config, chain: SolverChain::default() }
    }

    /// Replace the solver chain.
    #[must_use]
    pub fn with_chain(mut self, chain: SolverChain) -> Self {
        self.chain = chain;
        self
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Get the solver chain.
    #[must_use]
    pub const fn chain(&self) -> &SolverChain {
        &self.chain
    }

    /// Clean `returns` and estimate `mu` and the regularized covariance.
    ///
    /// `min_rows` is the number of cleaned rows required.
    pub(crate) fn estimate(
        &self,
        returns: &ReturnMatrix,
        min_rows: usize,
    ) -> Result<Estimates, OptimizeError> {
        self.config.validate()?;
        if returns.n_cols() == 0 {
            return Err(OptimizeError::EmptyUniverse);
        }
        let bounds = self.config.bounds;
        if !bounds.is_feasible(returns.n_cols()) {
            return Err(OptimizeError::InfeasibleBounds {
                n_assets: returns.n_cols(),
                lower: bounds.lower,
                upper: bounds.upper,
            });
        }

        let cleaned = self.config.cleaning()?.apply(returns);
        debug!(
            rows = returns.n_rows(),
            kept = cleaned.n_rows(),
            assets = cleaned.n_cols(),
            "return matrix cleaned"
        );
        if cleaned.n_rows() < min_rows {
            return Err(OptimizeError::InsufficientData {
                required: min_rows,
                actual: cleaned.n_rows(),
            });
        }

        let mu = expected_returns(cleaned.values(), self.config.estimator);
        let covariance = regularized_covariance(cleaned.values(), &self.config);
        Ok(Estimates { cleaned, mu, covariance })
    }

    /// Optimize weights for `method`.
    ///
    /// # Errors
    /// Returns `OptimizeError::EmptyUniverse` for a matrix without assets,
    /// `OptimizeError::InfeasibleBounds` when the universe is too small or
    /// too large for the weight bounds (fewer than two assets under the
    /// default 0.5 cap), `OptimizeError::InsufficientData` when fewer than `min_observations`
    /// rows survive cleaning, and `OptimizeError::InvalidConfig` for an
    /// invalid configuration. Solver failures are not errors: they end in
    /// the equal-weight fallback.
    pub fn optimize(
        &self,
        returns: &ReturnMatrix,
        method: OptimizationMethod,
    ) -> Result<OptimizationResult, OptimizeError> {
        let Estimates { cleaned, mu, covariance } =
            self.estimate(returns, self.config.min_observations)?;
        let tickers = cleaned.tickers().to_vec();
        let rf = self.config.risk_free_rate;

        let objective = match method {
            OptimizationMethod::MaxSharpe => Objective::MaxSharpe { risk_free_rate: rf },
            OptimizationMethod::MinVolatility => Objective::MinVolatility,
        };
        let problem =
            MeanVarianceProblem::new(mu.clone(), covariance.clone(), self.config.bounds, objective)?;

        let (weights, performance, source) = match self.chain.solve(&problem, rf) {
            Some(solution) => (
                Weights::new(tickers, solution.weights)?,
                solution.performance,
                AllocationSource::Solver(solution.solver),
            ),
            None => {
                warn!(
                    method = %method,
                    assets = tickers.len(),
                    "all solvers failed, using equal weights"
                );
                let performance = equal_weight_performance(
                    cleaned.values(),
                    rf,
                    self.config.fallback_volatility_floor,
                );
                (Weights::equal(tickers), performance, AllocationSource::EqualWeightFallback)
            }
        };

        Ok(OptimizationResult { weights, performance, mu, covariance, source })
    }
}

/// Optimize `returns` with the method named by `method`.
///
/// # Errors
/// Returns `OptimizeError::UnknownMethod` unless `method` is `max_sharpe` or
/// `min_volatility`; otherwise as [`PortfolioOptimizer::optimize`].
pub fn optimize_portfolio(
    returns: &ReturnMatrix,
    method: &str,
    config: &OptimizerConfig,
) -> Result<OptimizationResult, OptimizeError> {
    let method: OptimizationMethod =
        method.parse().map_err(|_| OptimizeError::UnknownMethod(method.to_string()))?;
    PortfolioOptimizer::with_config(*config).optimize(returns, method)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use factorfolio_traits::{PortfolioSolver, SolverError, WeightBounds};
    use rstest::rstest;
    use tracing_test::traced_test;

    use super::*;
    use crate::test_support::synthetic_returns;

    struct Singular;

    impl PortfolioSolver for Singular {
        fn name(&self) -> &str {
            "singular"
        }

        fn solve(&self, _: &MeanVarianceProblem) -> Result<Array1<f64>, SolverError> {
            Err(SolverError::Singular("stub".to_string()))
        }
    }

    fn assert_normalized(result: &OptimizationResult) {
        assert_relative_eq!(result.weights.sum(), 1.0, epsilon = 1e-6);
        for (_, w) in result.weights.iter() {
            assert!((-1e-6..=0.5 + 1e-6).contains(&w), "weight {w} out of bounds");
        }
        assert!(result.performance.is_finite());
    }

    #[rstest]
    #[case::max_sharpe(OptimizationMethod::MaxSharpe)]
    #[case::min_volatility(OptimizationMethod::MinVolatility)]
    fn solver_path_is_normalized(#[case] method: OptimizationMethod) {
        let returns = synthetic_returns(300, 5, 0.0008, 7);
        let result = PortfolioOptimizer::new().optimize(&returns, method).unwrap();

        assert_normalized(&result);
        assert_eq!(result.source, AllocationSource::Solver("clarabel".to_string()));
        assert_eq!(result.tickers(), returns.tickers());
        assert_eq!(result.mu.len(), 5);
        assert_eq!(result.covariance.dim(), (5, 5));
    }

    #[traced_test]
    #[test]
    fn failing_chain_falls_back_to_equal_weights() {
        let returns = synthetic_returns(300, 4, 0.0005, 11);
        let optimizer =
            PortfolioOptimizer::new().with_chain(SolverChain::empty().push(Singular).push(Singular));
        let result = optimizer.optimize(&returns, OptimizationMethod::MaxSharpe).unwrap();

        assert_eq!(result.source, AllocationSource::EqualWeightFallback);
        for (_, w) in result.weights.iter() {
            assert_relative_eq!(w, 0.25, epsilon = 1e-12);
        }
        assert_normalized(&result);
        assert!(logs_contain("all solvers failed, using equal weights"));
    }

    #[test]
    fn negative_drift_max_sharpe_falls_back() {
        // no asset beats the risk-free rate, so every solver refuses
        let returns = synthetic_returns(300, 3, -0.002, 3);
        let result = PortfolioOptimizer::new()
            .optimize(&returns, OptimizationMethod::MaxSharpe)
            .unwrap();
        assert_eq!(result.source, AllocationSource::EqualWeightFallback);
        assert_normalized(&result);
    }

    #[test]
    fn unknown_method_is_rejected() {
        let returns = synthetic_returns(300, 3, 0.0005, 1);
        let err = optimize_portfolio(&returns, "max_return", &OptimizerConfig::default()).unwrap_err();
        assert!(matches!(err, OptimizeError::UnknownMethod(m) if m == "max_return"));
    }

    #[test]
    fn method_names_are_parsed() {
        let returns = synthetic_returns(300, 3, 0.0005, 1);
        let result = optimize_portfolio(&returns, "min_volatility", &OptimizerConfig::default());
        assert!(result.is_ok());
    }

    #[test]
    fn insufficient_rows_after_cleaning() {
        let returns = synthetic_returns(100, 3, 0.0005, 2);
        let err = PortfolioOptimizer::new()
            .optimize(&returns, OptimizationMethod::MinVolatility)
            .unwrap_err();
        assert!(matches!(err, OptimizeError::InsufficientData { required: 252, actual: 100 }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn rows_with_missing_values_count_against_minimum() {
        let returns = synthetic_returns(260, 3, 0.0005, 5)
            .map_values(|&v| if v > 0.02 { f64::NAN } else { v });
        let err = PortfolioOptimizer::new()
            .optimize(&returns, OptimizationMethod::MinVolatility)
            .unwrap_err();
        assert!(matches!(err, OptimizeError::InsufficientData { .. }));
    }

    #[test]
    fn single_asset_cannot_meet_the_weight_cap() {
        let returns = synthetic_returns(300, 1, 0.0005, 4);
        let optimizer = PortfolioOptimizer::new();

        let err = optimizer.optimize(&returns, OptimizationMethod::MinVolatility).unwrap_err();
        assert!(matches!(err, OptimizeError::InfeasibleBounds { n_assets: 1, .. }));
        assert!(!err.is_recoverable());
        assert!(matches!(
            optimizer.efficient_frontier(&returns, 5),
            Err(OptimizeError::InfeasibleBounds { n_assets: 1, .. })
        ));
    }

    #[test]
    fn lower_bound_too_high_for_universe() {
        let returns = synthetic_returns(300, 4, 0.0005, 4);
        let config = OptimizerConfig {
            bounds: WeightBounds::new(0.3, 0.5),
            ..OptimizerConfig::default()
        };
        let err = PortfolioOptimizer::with_config(config)
            .optimize(&returns, OptimizationMethod::MaxSharpe)
            .unwrap_err();
        assert!(matches!(err, OptimizeError::InfeasibleBounds { n_assets: 4, .. }));
    }

    #[test]
    fn empty_universe_is_rejected() {
        let err = PortfolioOptimizer::new()
            .optimize(&ReturnMatrix::empty(), OptimizationMethod::MaxSharpe)
            .unwrap_err();
        assert!(matches!(err, OptimizeError::EmptyUniverse));
    }
}
