//! Weight vectors on the capped simplex.

use ndarray::Array1;

use crate::MathError;

const BISECTION_ITERATIONS: usize = 200;

/// Equal weights `1/n`.
///
/// # Returns
/// Array of `n` weights summing to 1, or an empty array for `n = 0`.
#[must_use]
pub fn equal_weights(n: usize) -> Array1<f64> {
    if n == 0 {
        return Array1::zeros(0);
    }
    Array1::from_elem(n, 1.0 / n as f64)
}

/// Euclidean projection of `v` onto `{w : Σw = 1, lower ≤ w_i ≤ upper}`.
///
/// The projection is `w_i = clamp(v_i − τ, lower, upper)` for the threshold τ
/// at which the weights sum to one, found by bisection.
///
/// # Errors
/// Returns `MathError::Infeasible` when `n · lower > 1` or `n · upper < 1`,
/// and `MathError::NumericalInstability` if `v` contains non-finite values.
pub fn project_capped_simplex(
    v: &Array1<f64>,
    lower: f64,
    upper: f64,
) -> Result<Array1<f64>, MathError> {
    let n = v.len();
    if n == 0 {
        return Err(MathError::EmptyData);
    }
    let nf = n as f64;
    if lower > upper || nf * lower > 1.0 + 1e-12 || nf * upper < 1.0 - 1e-12 {
        return Err(MathError::Infeasible(format!(
            "{n} weights in [{lower}, {upper}] cannot sum to 1"
        )));
    }
    if v.iter().any(|x| !x.is_finite()) {
        return Err(MathError::NumericalInstability("non-finite input to projection".into()));
    }

    let total = |tau: f64| v.iter().map(|&x| (x - tau).clamp(lower, upper)).sum::<f64>();
    let v_min = v.iter().copied().fold(f64::INFINITY, f64::min);
    let v_max = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    // total(lo) = n·upper ≥ 1, total(hi) = n·lower ≤ 1
    let mut lo = v_min - upper;
    let mut hi = v_max - lower;
    for _ in 0..BISECTION_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        if total(mid) > 1.0 {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < 1e-15 {
            break;
        }
    }
    let tau = 0.5 * (lo + hi);
    Ok(v.mapv(|x| (x - tau).clamp(lower, upper)))
}
