//! Ordered solver escalation.

use factorfolio_primitives::PortfolioPerformance;
use factorfolio_traits::{MeanVarianceProblem, PortfolioSolver, SolverError, WeightBounds};
use ndarray::{Array1, Array2};
use tracing::{info, warn};

use crate::{ActiveSetSolver, InteriorPointSolver, ProjectedGradientSolver};

const BOUND_TOLERANCE: f64 = 1e-6;

/// Annualized return, volatility and Sharpe ratio of `weights`.
#[must_use]
pub fn portfolio_performance(
    weights: &Array1<f64>,
    mu: &Array1<f64>,
    covariance: &Array2<f64>,
    risk_free_rate: f64,
) -> PortfolioPerformance {
    let annual_return = weights.dot(mu);
    let annual_volatility = weights.dot(&covariance.dot(weights)).sqrt();
    PortfolioPerformance {
        annual_return,
        annual_volatility,
        sharpe_ratio: (annual_return - risk_free_rate) / annual_volatility,
    }
}

/// Weights accepted from one solver of the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSolution {
    /// Cleaned weights, in problem order.
    pub weights: Array1<f64>,
    /// Performance at those weights.
    pub performance: PortfolioPerformance,
    /// Name of the solver that produced them.
    pub solver: String,
}

/// Solvers tried in order until one yields valid weights.
pub struct SolverChain {
    solvers: Vec<Box<dyn PortfolioSolver>>,
}

impl std::fmt::Debug for SolverChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverChain").field("solvers", &self.names()).finish()
    }
}

impl Default for SolverChain {
    fn default() -> Self {
        Self::empty()
            .push(InteriorPointSolver::new())
            .push(ProjectedGradientSolver::new())
            .push(ActiveSetSolver::new())
    }
}

impl SolverChain {
    /// Chain with the default priority order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain with no solvers; every solve falls through.
    #[must_use]
    pub fn empty() -> Self {
        Self { solvers: Vec::new() }
    }

    /// Append a solver at the lowest priority.
    #[must_use]
    pub fn push<S: PortfolioSolver + 'static>(mut self, solver: S) -> Self {
        self.solvers.push(Box::new(solver));
        self
    }

    /// Solver names in priority order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.solvers.iter().map(|s| s.name()).collect()
    }

    /// Number of solvers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.solvers.len()
    }

    /// Whether the chain has no solvers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.solvers.is_empty()
    }

    /// Try each solver in turn.
    ///
    /// Returns `None` when every solver errors or yields weights that fail
    /// validation.
    pub fn solve(
        &self,
        problem: &MeanVarianceProblem,
        risk_free_rate: f64,
    ) -> Option<ChainSolution> {
        for solver in &self.solvers {
            let attempt = solver.solve(problem).and_then(|raw| {
                let weights = clean_weights(&raw, problem.bounds())?;
                let performance = portfolio_performance(
                    &weights,
                    problem.mu(),
                    problem.covariance(),
                    risk_free_rate,
                );
                if !performance.is_finite() {
                    return Err(SolverError::Numerical(
                        "performance metrics are not finite".to_string(),
                    ));
                }
                Ok((weights, performance))
            });

            match attempt {
                Ok((weights, performance)) => {
                    info!(
                        solver = solver.name(),
                        sharpe = performance.sharpe_ratio,
                        "solver succeeded"
                    );
                    return Some(ChainSolution {
                        weights,
                        performance,
                        solver: solver.name().to_string(),
                    });
                }
                Err(err) => {
                    warn!(solver = solver.name(), error = %err, "solver failed");
                }
            }
        }
        None
    }
}

/// Clip into the bounds, renormalize, and validate.
fn clean_weights(raw: &Array1<f64>, bounds: WeightBounds) -> Result<Array1<f64>, SolverError> {
    if raw.iter().any(|w| !w.is_finite()) {
        return Err(SolverError::Numerical("weights contain NaN or infinity".to_string()));
    }
    let clipped = raw.mapv(|w| bounds.clamp(w));
    let total = clipped.sum();
    if !(total > 0.0) {
        return Err(SolverError::Numerical(format!("weights sum to {total}")));
    }
    let weights = clipped / total;
    if let Some(w) = weights.iter().find(|&&w| !bounds.contains(w, BOUND_TOLERANCE)) {
        return Err(SolverError::Numerical(format!(
            "weight {w} outside [{}, {}] after renormalization",
            bounds.lower, bounds.upper
        )));
    }
    Ok(weights)
}
