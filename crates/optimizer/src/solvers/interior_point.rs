//! Conic interior-point strategy backed by Clarabel.

use factorfolio_traits::{MeanVarianceProblem, Objective, PortfolioSolver, SolverError};
use ndarray::{Array1, Array2};

/// Dense quadratic program `min ½x'Px + q'x` s.t. `A_eq x = b_eq`, `A_in x ≤ b_in`.
struct DenseQp {
    p: Array2<f64>,
    q: Vec<f64>,
    eq: Vec<(Vec<f64>, f64)>,
    ineq: Vec<(Vec<f64>, f64)>,
}

/// Interior-point solver for all three objectives.
///
/// Max-Sharpe uses the homogenized form: minimize `y'Σy` subject to
/// `(μ − rf)'y = 1`, `1'y = κ` and `lb·κ ≤ y ≤ ub·κ`, then `w = y / κ`.
#[derive(Debug, Clone, Copy)]
pub struct InteriorPointSolver {
    max_iter: u32,
}

impl Default for InteriorPointSolver {
    fn default() -> Self {
        Self { max_iter: 200 }
    }
}

impl InteriorPointSolver {
    /// Create a solver with the default iteration limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the iteration limit.
    #[must_use]
    pub const fn with_max_iter(mut self, max_iter: u32) -> Self {
        self.max_iter = max_iter;
        self
    }

    fn box_and_budget(problem: &MeanVarianceProblem) -> DenseQp {
        let n = problem.n_assets();
        let bounds = problem.bounds();
        let mut ineq = Vec::with_capacity(2 * n + 1);
        for i in 0..n {
            let mut row = vec![0.0; n];
            row[i] = -1.0;
            ineq.push((row, -bounds.lower));
        }
        for i in 0..n {
            let mut row = vec![0.0; n];
            row[i] = 1.0;
            ineq.push((row, bounds.upper));
        }
        DenseQp {
            p: problem.covariance() * 2.0,
            q: vec![0.0; n],
            eq: vec![(vec![1.0; n], 1.0)],
            ineq,
        }
    }

    fn homogenized_sharpe(problem: &MeanVarianceProblem, risk_free_rate: f64) -> DenseQp {
        let n = problem.n_assets();
        let bounds = problem.bounds();

        let mut p = Array2::<f64>::zeros((n + 1, n + 1));
        p.slice_mut(ndarray::s![..n, ..n]).assign(&(problem.covariance() * 2.0));

        let mut excess: Vec<f64> = problem.mu().iter().map(|m| m - risk_free_rate).collect();
        excess.push(0.0);
        let mut budget = vec![1.0; n];
        budget.push(-1.0);

        let mut ineq = Vec::with_capacity(2 * n + 1);
        for i in 0..n {
            let mut row = vec![0.0; n + 1];
            row[i] = -1.0;
            row[n] = bounds.lower;
            ineq.push((row, 0.0));
        }
        for i in 0..n {
            let mut row = vec![0.0; n + 1];
            row[i] = 1.0;
            row[n] = -bounds.upper;
            ineq.push((row, 0.0));
        }
        let mut kappa = vec![0.0; n + 1];
        kappa[n] = -1.0;
        ineq.push((kappa, 0.0));

        DenseQp { p, q: vec![0.0; n + 1], eq: vec![(excess, 1.0), (budget, 0.0)], ineq }
    }

    fn run(&self, qp: &DenseQp) -> Result<Vec<f64>, SolverError> {
        use clarabel::algebra::*;
        use clarabel::solver::*;

        let n = qp.q.len();

        // upper triangle of P, column by column
        let mut p_data = Vec::new();
        let mut p_indices = Vec::new();
        let mut p_indptr = vec![0];
        for j in 0..n {
            for i in 0..=j {
                let val = qp.p[[i, j]];
                if val != 0.0 {
                    p_data.push(val);
                    p_indices.push(i);
                }
            }
            p_indptr.push(p_data.len());
        }
        let p = CscMatrix::new(n, n, p_indptr, p_indices, p_data);

        let rows: Vec<&(Vec<f64>, f64)> = qp.eq.iter().chain(qp.ineq.iter()).collect();
        let m = rows.len();
        let mut a_data = Vec::new();
        let mut a_indices = Vec::new();
        let mut a_indptr = vec![0];
        for j in 0..n {
            for (i, (row, _)) in rows.iter().enumerate() {
                if row[j] != 0.0 {
                    a_data.push(row[j]);
                    a_indices.push(i);
                }
            }
            a_indptr.push(a_data.len());
        }
        let a = CscMatrix::new(m, n, a_indptr, a_indices, a_data);
        let b: Vec<f64> = rows.iter().map(|(_, rhs)| *rhs).collect();

        let cones = [ZeroConeT(qp.eq.len()), NonnegativeConeT(qp.ineq.len())];

        let settings = DefaultSettingsBuilder::default()
            .max_iter(self.max_iter)
            .verbose(false)
            .build()
            .map_err(|e| factorfolio_traits::SolverError::Backend(format!("{e}")))?;

        let mut solver = DefaultSolver::new(&p, &qp.q, &a, &b, &cones, settings)
            .map_err(|e| factorfolio_traits::SolverError::Backend(format!("{e:?}")))?;
        solver.solve();

        match solver.solution.status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => Ok(solver.solution.x.clone()),
            SolverStatus::MaxIterations | SolverStatus::MaxTime => {
                Err(factorfolio_traits::SolverError::NotConverged {
                    iterations: self.max_iter as usize,
                })
            }
            status => Err(factorfolio_traits::SolverError::Backend(format!("status {status:?}"))),
        }
    }
}

impl PortfolioSolver for InteriorPointSolver {
    fn name(&self) -> &str {
        "clarabel"
    }

    fn solve(&self, problem: &MeanVarianceProblem) -> Result<Array1<f64>, SolverError> {
        problem.check_feasible()?;
        let n = problem.n_assets();

        match problem.objective() {
            Objective::MinVolatility => {
                let x = self.run(&Self::box_and_budget(problem))?;
                Ok(Array1::from(x))
            }
            Objective::TargetReturn { target } => {
                let mut qp = Self::box_and_budget(problem);
                let row: Vec<f64> = problem.mu().iter().map(|m| -m).collect();
                qp.ineq.push((row, -target));
                let x = self.run(&qp)?;
                Ok(Array1::from(x))
            }
            Objective::MaxSharpe { risk_free_rate } => {
                let x = self.run(&Self::homogenized_sharpe(problem, risk_free_rate))?;
                let kappa = x[n];
                if !(kappa > 1e-12) {
                    return Err(SolverError::Numerical(format!(
                        "homogenizing variable collapsed to {kappa}"
                    )));
                }
                Ok(x[..n].iter().map(|y| y / kappa).collect())
            }
        }
    }
}
