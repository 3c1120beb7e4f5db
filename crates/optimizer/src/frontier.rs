//! Efficient frontier sweep.

use factorfolio_primitives::ReturnMatrix;
use factorfolio_traits::{MeanVarianceProblem, Objective};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::optimize::Estimates;
use crate::{OptimizeError, PortfolioOptimizer};

/// One point of the efficient frontier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrontierPoint {
    /// Annualized expected return.
    pub expected_return: f64,
    /// Annualized volatility.
    pub volatility: f64,
}

impl PortfolioOptimizer {
    /// Minimum-variance portfolios for `points` target returns evenly spaced
    /// over `[min μ, max μ]`.
    ///
    /// Rows are cleaned as for [`PortfolioOptimizer::optimize`] but the
    /// minimum-row requirement is not applied. Targets every solver declines
    /// are omitted, so fewer than `points` points may be returned.
    ///
    /// # Errors
    /// Returns `OptimizeError::EmptyUniverse` for a matrix without assets and
    /// `OptimizeError::InsufficientData` when no rows survive cleaning.
    pub fn efficient_frontier(
        &self,
        returns: &ReturnMatrix,
        points: usize,
    ) -> Result<Vec<FrontierPoint>, OptimizeError> {
        let Estimates { mu, covariance, .. } = self.estimate(returns, 1)?;
        let lo = mu.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = mu.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let problem = MeanVarianceProblem::new(
            mu,
            covariance,
            self.config().bounds,
            Objective::MinVolatility,
        )?;
        let rf = self.config().risk_free_rate;

        let targets: Vec<f64> = match points {
            0 => Vec::new(),
            1 => vec![lo],
            _ => (0..points).map(|i| lo + (hi - lo) * i as f64 / (points - 1) as f64).collect(),
        };

        let frontier: Vec<FrontierPoint> = targets
            .into_iter()
            .filter_map(|target| {
                let problem = problem.with_objective(Objective::TargetReturn { target });
                let solution = self.chain().solve(&problem, rf);
                if solution.is_none() {
                    debug!(target, "frontier target skipped");
                }
                solution.map(|s| FrontierPoint {
                    expected_return: s.performance.annual_return,
                    volatility: s.performance.annual_volatility,
                })
            })
            .collect();
        Ok(frontier)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::synthetic_returns;
    use crate::{OptimizerConfig, PortfolioOptimizer, SolverChain};

    #[test]
    fn frontier_is_ordered_and_upward_sloping() {
        let returns = synthetic_returns(300, 4, 0.0006, 21);
        let config = OptimizerConfig {
            bounds: factorfolio_traits::WeightBounds::new(0.0, 1.0),
            ..Default::default()
        };
        let frontier = PortfolioOptimizer::with_config(config).efficient_frontier(&returns, 8).unwrap();

        assert!(!frontier.is_empty());
        for pair in frontier.windows(2) {
            assert!(pair[1].expected_return >= pair[0].expected_return - 1e-6);
        }
        // above the minimum-variance point, more return costs more risk
        let last = frontier[frontier.len() - 1];
        let min_vol = frontier.iter().map(|p| p.volatility).fold(f64::INFINITY, f64::min);
        assert!(last.volatility >= min_vol);
    }

    #[test]
    fn targets_every_solver_declines_are_omitted() {
        let returns = synthetic_returns(300, 4, 0.0006, 21);
        let optimizer = PortfolioOptimizer::new().with_chain(SolverChain::empty());
        assert!(optimizer.efficient_frontier(&returns, 5).unwrap().is_empty());
    }

    #[test]
    fn short_history_is_allowed() {
        let returns = synthetic_returns(30, 3, 0.0006, 4);
        let frontier = PortfolioOptimizer::new().efficient_frontier(&returns, 3).unwrap();
        assert!(frontier.len() <= 3);
    }
}
