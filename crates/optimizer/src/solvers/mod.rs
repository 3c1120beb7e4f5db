//! Solver strategies for the escalation chain.

use factorfolio_math::MathError;
use factorfolio_traits::{SolverError, WeightBounds};
use ndarray::Array1;

mod active_set;
pub use active_set::ActiveSetSolver;

mod interior_point;
pub use interior_point::InteriorPointSolver;

mod projected_gradient;
pub use projected_gradient::ProjectedGradientSolver;

fn math_to_solver(err: MathError) -> SolverError {
    match err {
        MathError::LinearAlgebra(msg) => SolverError::Singular(msg),
        MathError::SingularPivot { column } => {
            SolverError::Singular(format!("no pivot in column {column}"))
        }
        other => SolverError::Numerical(other.to_string()),
    }
}

/// Feasible portfolio with the highest expected return under the bounds.
///
/// Every asset starts at the lower bound; the remaining budget goes to
/// assets in descending order of `mu`, each up to the upper bound.
fn max_return_portfolio(mu: &Array1<f64>, bounds: WeightBounds) -> Array1<f64> {
    let n = mu.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| mu[b].total_cmp(&mu[a]));

    let mut w = Array1::from_elem(n, bounds.lower);
    let mut budget = 1.0 - bounds.lower * n as f64;
    for i in order {
        if budget <= 0.0 {
            break;
        }
        let add = budget.min(bounds.upper - bounds.lower);
        w[i] += add;
        budget -= add;
    }
    w
}
