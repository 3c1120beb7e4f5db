//! Mean-variance solver trait definitions.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Errors a solver reports when it declines or fails to produce weights.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    /// Problem dimensions are inconsistent.
    #[error("dimension mismatch for {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
        /// Context description.
        context: String,
    },

    /// No weight vector summing to one fits inside the bounds.
    #[error("infeasible bounds [{lower}, {upper}] for {n_assets} assets")]
    InfeasibleBounds {
        /// Number of assets.
        n_assets: usize,
        /// Lower bound per asset.
        lower: f64,
        /// Upper bound per asset.
        upper: f64,
    },

    /// No asset has expected return above the risk-free rate.
    #[error("no asset has expected return above the risk-free rate {risk_free_rate}")]
    NoPositiveExcessReturn {
        /// Risk-free rate of the objective.
        risk_free_rate: f64,
    },

    /// Target return is outside the attainable range.
    #[error("target return {target} is not attainable")]
    UnattainableTarget {
        /// Requested target.
        target: f64,
    },

    /// Objective not handled by this solver.
    #[error("objective not supported by {solver}")]
    Unsupported {
        /// Solver name.
        solver: String,
    },

    /// Iteration limit reached before convergence.
    #[error("no convergence after {iterations} iterations")]
    NotConverged {
        /// Iterations performed.
        iterations: usize,
    },

    /// Linear system is singular.
    #[error("singular system: {0}")]
    Singular(String),

    /// Backend solver reported a failure.
    #[error("backend failure: {0}")]
    Backend(String),

    /// Non-finite values in the solution.
    #[error("numerical error: {0}")]
    Numerical(String),
}

impl SolverError {
    /// Returns whether the next solver in a chain may still succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::DimensionMismatch { .. })
    }
}

/// Per-asset box constraint `lower ≤ w_i ≤ upper`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightBounds {
    /// Minimum weight per asset.
    pub lower: f64,
    /// Maximum weight per asset.
    pub upper: f64,
}

impl Default for WeightBounds {
    fn default() -> Self {
        Self { lower: 0.0, upper: 0.5 }
    }
}

impl WeightBounds {
    /// Create bounds.
    #[must_use]
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Whether a fully-invested portfolio of `n` assets fits inside the bounds.
    #[must_use]
    pub fn is_feasible(&self, n: usize) -> bool {
        let n = n as f64;
        n > 0.0
            && self.lower <= self.upper
            && n * self.lower <= 1.0 + 1e-12
            && n * self.upper >= 1.0 - 1e-12
    }

    /// Whether a weight lies inside the bounds within `tol`.
    #[must_use]
    pub fn contains(&self, w: f64, tol: f64) -> bool {
        w >= self.lower - tol && w <= self.upper + tol
    }

    /// Clamp a weight into the bounds.
    #[must_use]
    pub fn clamp(&self, w: f64) -> f64 {
        w.clamp(self.lower, self.upper)
    }
}

/// What a solver optimizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Objective {
    /// Maximize `(μᵀw − r_f) / √(wᵀΣw)`.
    MaxSharpe {
        /// Risk-free rate.
        risk_free_rate: f64,
    },
    /// Minimize `wᵀΣw`.
    MinVolatility,
    /// Minimize `wᵀΣw` subject to `μᵀw ≥ target`.
    TargetReturn {
        /// Required expected return.
        target: f64,
    },
}

/// Single-period long-only mean-variance problem.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanVarianceProblem {
    mu: Array1<f64>,
    covariance: Array2<f64>,
    bounds: WeightBounds,
    objective: Objective,
}

impl MeanVarianceProblem {
    /// Create a problem, checking that `mu` and the covariance agree in size.
    ///
    /// # Errors
    /// Returns `SolverError::DimensionMismatch` if the covariance is not `n x n`.
    pub fn new(
        mu: Array1<f64>,
        covariance: Array2<f64>,
        bounds: WeightBounds,
        objective: Objective,
    ) -> Result<Self, SolverError> {
        let n = mu.len();
        if covariance.nrows() != n || covariance.ncols() != n {
            return Err(SolverError::DimensionMismatch {
                expected: n,
                actual: covariance.nrows().max(covariance.ncols()),
                context: "covariance".to_string(),
            });
        }
        Ok(Self { mu, covariance, bounds, objective })
    }

    /// Expected returns.
    #[must_use]
    pub const fn mu(&self) -> &Array1<f64> {
        &self.mu
    }

    /// Covariance matrix.
    #[must_use]
    pub const fn covariance(&self) -> &Array2<f64> {
        &self.covariance
    }

    /// Box bounds.
    #[must_use]
    pub const fn bounds(&self) -> WeightBounds {
        self.bounds
    }

    /// Objective.
    #[must_use]
    pub const fn objective(&self) -> Objective {
        self.objective
    }

    /// Number of assets.
    #[must_use]
    pub fn n_assets(&self) -> usize {
        self.mu.len()
    }

    /// Same data with another objective.
    #[must_use]
    pub fn with_objective(&self, objective: Objective) -> Self {
        Self { objective, ..self.clone() }
    }

    /// Checks shared by all solvers before any work is done.
    ///
    /// # Errors
    /// Returns `InfeasibleBounds` when the bounds admit no fully-invested portfolio,
    /// `NoPositiveExcessReturn` for a Sharpe objective with no asset above the
    /// risk-free rate, and `UnattainableTarget` for a target above every asset.
    pub fn check_feasible(&self) -> Result<(), SolverError> {
        let n = self.n_assets();
        if !self.bounds.is_feasible(n) {
            return Err(SolverError::InfeasibleBounds {
                n_assets: n,
                lower: self.bounds.lower,
                upper: self.bounds.upper,
            });
        }
        let max_mu = self.mu.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        match self.objective {
            Objective::MaxSharpe { risk_free_rate } if max_mu <= risk_free_rate => {
                Err(SolverError::NoPositiveExcessReturn { risk_free_rate })
            }
            Objective::TargetReturn { target } if target > max_mu + 1e-12 => {
                Err(SolverError::UnattainableTarget { target })
            }
            _ => Ok(()),
        }
    }
}

/// One strategy in a priority-ordered solver chain.
///
/// Implementations return raw weights; bounds clipping, renormalization and
/// validation are done by the caller.
pub trait PortfolioSolver: Send + Sync {
    /// Name reported in logs and results.
    fn name(&self) -> &str;

    /// Solve the problem.
    ///
    /// # Errors
    /// Returns `SolverError` when the solver declines or fails; the caller
    /// escalates to the next solver.
    fn solve(&self, problem: &MeanVarianceProblem) -> Result<Array1<f64>, SolverError>;
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use rstest::rstest;

    use super::*;

    fn problem(objective: Objective) -> MeanVarianceProblem {
        MeanVarianceProblem::new(
            array![0.05, 0.10, 0.01],
            Array2::eye(3),
            WeightBounds::default(),
            objective,
        )
        .unwrap()
    }

    #[rstest]
    #[case(1, false)]
    #[case(2, true)]
    #[case(10, true)]
    fn default_bounds_feasibility(#[case] n: usize, #[case] feasible: bool) {
        assert_eq!(WeightBounds::default().is_feasible(n), feasible);
    }

    #[test]
    fn dimension_mismatch_rejected() {
        let err = MeanVarianceProblem::new(
            array![0.1, 0.2],
            Array2::eye(3),
            WeightBounds::default(),
            Objective::MinVolatility,
        )
        .unwrap_err();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn sharpe_requires_excess_return() {
        let p = problem(Objective::MaxSharpe { risk_free_rate: 0.2 });
        let err = p.check_feasible().unwrap_err();
        assert!(matches!(err, SolverError::NoPositiveExcessReturn { .. }));
        assert!(err.is_recoverable());
        assert!(problem(Objective::MaxSharpe { risk_free_rate: 0.02 }).check_feasible().is_ok());
    }

    #[test]
    fn unattainable_target() {
        let p = problem(Objective::TargetReturn { target: 0.5 });
        assert!(matches!(p.check_feasible(), Err(SolverError::UnattainableTarget { .. })));
    }

    #[test]
    fn clamp_into_bounds() {
        let b = WeightBounds::default();
        assert_eq!(b.clamp(0.7), 0.5);
        assert_eq!(b.clamp(-0.1), 0.0);
        assert!(b.contains(0.5 + 1e-9, 1e-6));
    }
}
