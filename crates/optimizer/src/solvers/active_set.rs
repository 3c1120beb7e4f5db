//! Primal active-set strategy for small dense quadratic programs.

use factorfolio_math::{MathError, equal_weights, project_capped_simplex, solve_linear_system};
use factorfolio_traits::{
    MeanVarianceProblem, Objective, PortfolioSolver, SolverError, WeightBounds,
};
use ndarray::{Array1, Array2, s};

use super::{math_to_solver, max_return_portfolio};

const STEP_TOLERANCE: f64 = 1e-10;
const MULTIPLIER_TOLERANCE: f64 = 1e-10;

/// `min ½x'Hx` subject to `E x = e` and `G x ≤ h`.
///
/// `e` is implied by the starting point, which must satisfy the equalities.
struct QuadraticProgram {
    hessian: Array2<f64>,
    eq: Array2<f64>,
    ineq: Array2<f64>,
    ineq_rhs: Array1<f64>,
}

impl QuadraticProgram {
    /// Box rows `−x_i ≤ −lower·scale_i`, `x_i ≤ upper·scale_i` for the first `n` variables.
    ///
    /// `scale` is `None` for plain weights, or the index of the homogenizing
    /// variable whose value multiplies the bounds.
    fn box_rows(
        n: usize,
        n_vars: usize,
        bounds: WeightBounds,
        scale: Option<usize>,
    ) -> (Array2<f64>, Array1<f64>) {
        let mut g = Array2::<f64>::zeros((2 * n, n_vars));
        let mut h = Array1::<f64>::zeros(2 * n);
        for i in 0..n {
            g[[i, i]] = -1.0;
            g[[n + i, i]] = 1.0;
            match scale {
                Some(k) => {
                    g[[i, k]] = bounds.lower;
                    g[[n + i, k]] = -bounds.upper;
                }
                None => {
                    h[i] = -bounds.lower;
                    h[n + i] = bounds.upper;
                }
            }
        }
        (g, h)
    }
}

/// Name the KKT row behind a factorization failure.
///
/// A pivot failure past the primal block means the constraint in that row
/// depends on the equality and working-set rows above it.
fn kkt_failure(err: MathError, n: usize, n_eq: usize, working: &[usize]) -> SolverError {
    match err {
        MathError::SingularPivot { column } if column >= n => {
            let r = column - n;
            let constraint = match r.checked_sub(n_eq) {
                None => format!("equality row {r}"),
                Some(k) => working
                    .get(k)
                    .map_or_else(|| format!("constraint {r}"), |i| format!("inequality row {i}")),
            };
            SolverError::Singular(format!("{constraint} is linearly dependent on the working set"))
        }
        other => math_to_solver(other),
    }
}

/// Dense primal active-set solver.
///
/// Starts from a feasible point, solves the equality-constrained KKT system
/// on the working set, and adds blocking or drops negative-multiplier
/// constraints until the KKT conditions hold.
#[derive(Debug, Clone, Copy)]
pub struct ActiveSetSolver {
    max_iter: usize,
}

impl Default for ActiveSetSolver {
    fn default() -> Self {
        Self { max_iter: 1_000 }
    }
}

impl ActiveSetSolver {
    /// Create a solver with the default iteration limit.
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

    fn run(&self, qp: &QuadraticProgram, x0: Array1<f64>) -> Result<Array1<f64>, SolverError> {
        let n = x0.len();
        let n_eq = qp.eq.nrows();
        let mut x = x0;
        let mut working: Vec<usize> = Vec::new();

        for _ in 0..self.max_iter {
            let m = n_eq + working.len();
            let mut kkt = Array2::<f64>::zeros((n + m, n + m));
            kkt.slice_mut(s![..n, ..n]).assign(&qp.hessian);
            let mut rhs = Array1::<f64>::zeros(n + m);
            rhs.slice_mut(s![..n]).assign(&(-qp.hessian.dot(&x)));

            for (r, row) in qp
                .eq
                .rows()
                .into_iter()
                .chain(working.iter().map(|&i| qp.ineq.row(i)))
                .enumerate()
            {
                kkt.slice_mut(s![n + r, ..n]).assign(&row);
                kkt.slice_mut(s![..n, n + r]).assign(&row);
            }

            let solution = solve_linear_system(&kkt, &rhs)
                .map_err(|err| kkt_failure(err, n, n_eq, &working))?;
            let p = solution.slice(s![..n]).to_owned();
            let multipliers = solution.slice(s![n + n_eq..]).to_owned();

            if p.iter().all(|v| v.abs() < STEP_TOLERANCE) {
                let most_negative = multipliers
                    .iter()
                    .enumerate()
                    .filter(|(_, l)| **l < -MULTIPLIER_TOLERANCE)
                    .min_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(k, _)| k);
                match most_negative {
                    Some(k) => {
                        working.remove(k);
                    }
                    None => return Ok(x),
                }
                continue;
            }

            let mut alpha = 1.0;
            let mut blocking = None;
            for (i, row) in qp.ineq.rows().into_iter().enumerate() {
                if working.contains(&i) {
                    continue;
                }
                let ap = row.dot(&p);
                if ap > STEP_TOLERANCE {
                    let slack = (qp.ineq_rhs[i] - row.dot(&x)).max(0.0);
                    let ratio = slack / ap;
                    if ratio < alpha {
                        alpha = ratio;
                        blocking = Some(i);
                    }
                }
            }

            x = x + p * alpha;
            if let Some(i) = blocking {
                working.push(i);
            }
        }

        Err(SolverError::NotConverged { iterations: self.max_iter })
    }

    fn min_volatility(&self, problem: &MeanVarianceProblem) -> Result<Array1<f64>, SolverError> {
        let n = problem.n_assets();
        let bounds = problem.bounds();
        let (ineq, ineq_rhs) = QuadraticProgram::box_rows(n, n, bounds, None);
        let qp = QuadraticProgram {
            hessian: problem.covariance() * 2.0,
            eq: Array2::ones((1, n)),
            ineq,
            ineq_rhs,
        };
        let x0 = project_capped_simplex(&equal_weights(n), bounds.lower, bounds.upper)
            .map_err(math_to_solver)?;
        self.run(&qp, x0)
    }

    fn target_return(
        &self,
        problem: &MeanVarianceProblem,
        target: f64,
    ) -> Result<Array1<f64>, SolverError> {
        let n = problem.n_assets();
        let bounds = problem.bounds();
        let x0 = max_return_portfolio(problem.mu(), bounds);
        if problem.mu().dot(&x0) < target - 1e-12 {
            return Err(SolverError::UnattainableTarget { target });
        }

        let (boxes, box_rhs) = QuadraticProgram::box_rows(n, n, bounds, None);
        let mut ineq = Array2::<f64>::zeros((2 * n + 1, n));
        ineq.slice_mut(s![..2 * n, ..]).assign(&boxes);
        ineq.row_mut(2 * n).assign(&(-problem.mu()));
        let mut ineq_rhs = Array1::<f64>::zeros(2 * n + 1);
        ineq_rhs.slice_mut(s![..2 * n]).assign(&box_rhs);
        ineq_rhs[2 * n] = -target;

        let qp = QuadraticProgram {
            hessian: problem.covariance() * 2.0,
            eq: Array2::ones((1, n)),
            ineq,
            ineq_rhs,
        };
        self.run(&qp, x0)
    }

    fn max_sharpe(
        &self,
        problem: &MeanVarianceProblem,
        risk_free_rate: f64,
    ) -> Result<Array1<f64>, SolverError> {
        let n = problem.n_assets();
        let bounds = problem.bounds();
        let w0 = max_return_portfolio(problem.mu(), bounds);
        let excess = problem.mu().dot(&w0) - risk_free_rate;
        if !(excess > 0.0) {
            return Err(SolverError::NoPositiveExcessReturn { risk_free_rate });
        }

        // variables [y; κ] with w = y / κ
        let mut x0 = Array1::<f64>::zeros(n + 1);
        x0.slice_mut(s![..n]).assign(&(&w0 / excess));
        x0[n] = 1.0 / excess;

        let mut hessian = Array2::<f64>::zeros((n + 1, n + 1));
        hessian.slice_mut(s![..n, ..n]).assign(&(problem.covariance() * 2.0));

        let mut eq = Array2::<f64>::zeros((2, n + 1));
        eq.slice_mut(s![0, ..n]).assign(&problem.mu().mapv(|m| m - risk_free_rate));
        eq.slice_mut(s![1, ..n]).fill(1.0);
        eq[[1, n]] = -1.0;

        let (boxes, box_rhs) = QuadraticProgram::box_rows(n, n + 1, bounds, Some(n));
        let mut ineq = Array2::<f64>::zeros((2 * n + 1, n + 1));
        ineq.slice_mut(s![..2 * n, ..]).assign(&boxes);
        ineq[[2 * n, n]] = -1.0;
        let mut ineq_rhs = Array1::<f64>::zeros(2 * n + 1);
        ineq_rhs.slice_mut(s![..2 * n]).assign(&box_rhs);

        let qp = QuadraticProgram { hessian, eq, ineq, ineq_rhs };
        let x = self.run(&qp, x0)?;
        let kappa = x[n];
        if !(kappa > 1e-12) {
            return Err(SolverError::Numerical(format!(
                "homogenizing variable collapsed to {kappa}"
            )));
        }
        Ok(x.slice(s![..n]).mapv(|y| y / kappa))
    }
}

impl PortfolioSolver for ActiveSetSolver {
    fn name(&self) -> &str {
        "active_set"
    }

    fn solve(&self, problem: &MeanVarianceProblem) -> Result<Array1<f64>, SolverError> {
        problem.check_feasible()?;
        match problem.objective() {
            Objective::MinVolatility => self.min_volatility(problem),
            Objective::TargetReturn { target } => self.target_return(problem, target),
            Objective::MaxSharpe { risk_free_rate } => self.max_sharpe(problem, risk_free_rate),
        }
    }
}
