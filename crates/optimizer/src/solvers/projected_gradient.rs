//! First-order strategy: gradient steps projected onto the capped simplex.

use factorfolio_math::{equal_weights, project_capped_simplex};
use factorfolio_traits::{MeanVarianceProblem, Objective, PortfolioSolver, SolverError};
use ndarray::{Array1, Array2};

use super::{math_to_solver, max_return_portfolio};

const ARMIJO: f64 = 1e-4;
const MIN_STEP: f64 = 1e-14;

/// Projected-gradient solver for min-volatility and max-Sharpe.
///
/// Target-return problems are declined with `SolverError::Unsupported`.
#[derive(Debug, Clone, Copy)]
pub struct ProjectedGradientSolver {
    max_iter: usize,
    tolerance: f64,
}

impl Default for ProjectedGradientSolver {
    fn default() -> Self {
        Self { max_iter: 10_000, tolerance: 1e-10 }
    }
}

impl ProjectedGradientSolver {
    /// Create a solver with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the iteration limit.
    #[must_use]
    pub const fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the convergence tolerance on the largest weight change.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn min_volatility(&self, problem: &MeanVarianceProblem) -> Result<Array1<f64>, SolverError> {
        let sigma = problem.covariance();
        let bounds = problem.bounds();
        let lipschitz = 2.0 * sigma.iter().map(|v| v * v).sum::<f64>().sqrt();
        if !(lipschitz > 0.0) {
            // zero covariance: every feasible point is optimal
            return Ok(equal_weights(problem.n_assets()));
        }
        let step = 1.0 / lipschitz;

        let mut w = project_capped_simplex(
            &equal_weights(problem.n_assets()),
            bounds.lower,
            bounds.upper,
        )
        .map_err(math_to_solver)?;
        for _ in 0..self.max_iter {
            let grad = sigma.dot(&w) * 2.0;
            let next = project_capped_simplex(&(&w - &(grad * step)), bounds.lower, bounds.upper)
                .map_err(math_to_solver)?;
            let change = max_abs_diff(&next, &w);
            w = next;
            if change < self.tolerance {
                return Ok(w);
            }
        }
        Err(SolverError::NotConverged { iterations: self.max_iter })
    }

    fn max_sharpe(
        &self,
        problem: &MeanVarianceProblem,
        risk_free_rate: f64,
    ) -> Result<Array1<f64>, SolverError> {
        let mu = problem.mu();
        let sigma = problem.covariance();
        let bounds = problem.bounds();

        let mut w = max_return_portfolio(mu, bounds);
        let mut value = sharpe(&w, mu, sigma, risk_free_rate)?;
        let mut converged = false;

        for _ in 0..self.max_iter {
            let grad = sharpe_gradient(&w, mu, sigma, risk_free_rate)?;
            let mut step = 1.0;
            let mut accepted = None;
            while step >= MIN_STEP {
                let candidate =
                    project_capped_simplex(&(&w + &(&grad * step)), bounds.lower, bounds.upper)
                        .map_err(math_to_solver)?;
                let candidate_value = sharpe(&candidate, mu, sigma, risk_free_rate)?;
                if candidate_value >= value + ARMIJO * grad.dot(&(&candidate - &w)) {
                    accepted = Some((candidate, candidate_value));
                    break;
                }
                step *= 0.5;
            }

            // no ascent step left: stationary
            let Some((next, next_value)) = accepted else {
                converged = true;
                break;
            };
            let change = max_abs_diff(&next, &w);
            w = next;
            value = next_value;
            if change < self.tolerance {
                converged = true;
                break;
            }
        }

        if !converged {
            return Err(SolverError::NotConverged { iterations: self.max_iter });
        }

        if mu.dot(&w) - risk_free_rate <= 0.0 {
            return Err(SolverError::NoPositiveExcessReturn { risk_free_rate });
        }
        Ok(w)
    }
}

fn max_abs_diff(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)
}

fn volatility(w: &Array1<f64>, sigma: &Array2<f64>) -> Result<f64, SolverError> {
    let variance = w.dot(&sigma.dot(w));
    if !(variance > 0.0) {
        return Err(SolverError::Numerical(format!("portfolio variance is {variance}")));
    }
    Ok(variance.sqrt())
}

fn sharpe(
    w: &Array1<f64>,
    mu: &Array1<f64>,
    sigma: &Array2<f64>,
    risk_free_rate: f64,
) -> Result<f64, SolverError> {
    Ok((mu.dot(w) - risk_free_rate) / volatility(w, sigma)?)
}

/// `∇ (μ'w − rf)/σ = μ/σ − (μ'w − rf)·Σw/σ³`
fn sharpe_gradient(
    w: &Array1<f64>,
    mu: &Array1<f64>,
    sigma: &Array2<f64>,
    risk_free_rate: f64,
) -> Result<Array1<f64>, SolverError> {
    let vol = volatility(w, sigma)?;
    let excess = mu.dot(w) - risk_free_rate;
    Ok(mu / vol - sigma.dot(w) * (excess / vol.powi(3)))
}

impl PortfolioSolver for ProjectedGradientSolver {
    fn name(&self) -> &str {
        "projected_gradient"
    }

    fn solve(&self, problem: &MeanVarianceProblem) -> Result<Array1<f64>, SolverError> {
        match problem.objective() {
            Objective::TargetReturn { .. } => {
                Err(SolverError::Unsupported { solver: self.name().to_string() })
            }
            Objective::MinVolatility => {
                problem.check_feasible()?;
                self.min_volatility(problem)
            }
            Objective::MaxSharpe { risk_free_rate } => {
                problem.check_feasible()?;
                self.max_sharpe(problem, risk_free_rate)
            }
        }
    }
}
