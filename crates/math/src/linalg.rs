//! Linear algebra operations for portfolio optimization.

use ndarray::{Array1, Array2, Axis, Zip, concatenate, s};

use crate::MathError;

const PIVOT_TOLERANCE: f64 = 1e-14;

/// Solve `a x = b` by Gaussian elimination with partial pivoting.
///
/// # Errors
/// Returns `MathError::SingularPivot` naming the first elimination column
/// without a usable pivot, `MathError::LinearAlgebra` if `a` is not square,
/// and `MathError::DimensionMismatch` if `b` has the wrong length.
pub fn solve_linear_system(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, MathError> {
    let n = a.nrows();
    if n == 0 {
        return Err(MathError::EmptyData);
    }
    if !a.is_square() {
        return Err(MathError::LinearAlgebra("matrix must be square".to_string()));
    }
    if b.len() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: b.len() });
    }

    let mut aug = concatenate(Axis(1), &[a.view(), b.view().insert_axis(Axis(1))])
        .map_err(|e| MathError::LinearAlgebra(e.to_string()))?;

    for col in 0..n {
        // first row of largest magnitude; NaN ranks highest and fails the check
        let (offset, magnitude) = aug
            .slice(s![col.., col])
            .iter()
            .map(|v| v.abs())
            .enumerate()
            .min_by(|x, y| y.1.total_cmp(&x.1))
            .unwrap_or((0, f64::NAN));
        if !(magnitude >= PIVOT_TOLERANCE) {
            return Err(MathError::SingularPivot { column: col });
        }

        if offset > 0 {
            let (mut top, mut other) = aug.multi_slice_mut((s![col, ..], s![col + offset, ..]));
            Zip::from(&mut top).and(&mut other).for_each(std::mem::swap);
        }

        let pivot_row = aug.row(col).to_owned();
        for mut row in aug.slice_mut(s![col + 1.., ..]).rows_mut() {
            let factor = row[col] / pivot_row[col];
            if factor != 0.0 {
                row.scaled_add(-factor, &pivot_row);
            }
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let tail = aug.slice(s![i, i + 1..n]).dot(&x.slice(s![i + 1..]));
        x[i] = (aug[[i, n]] - tail) / aug[[i, i]];
    }

    if !x.iter().all(|v| v.is_finite()) {
        return Err(MathError::NumericalInstability("non-finite solution".to_string()));
    }
    Ok(x)
}

/// Quadratic form `wᵀ Σ w`.
///
/// # Errors
/// Returns `MathError::DimensionMismatch` if `sigma` is not `n x n`.
pub fn quad_form(w: &Array1<f64>, sigma: &Array2<f64>) -> Result<f64, MathError> {
    let n = w.len();
    if sigma.nrows() != n || sigma.ncols() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: sigma.nrows() });
    }
    Ok(w.dot(&sigma.dot(w)))
}

/// Average a square matrix with its transpose.
#[must_use]
pub fn symmetrize(m: &Array2<f64>) -> Array2<f64> {
    (m + &m.t()) / 2.0
}

/// Whether every entry of the matrix is finite.
#[must_use]
pub fn is_finite_matrix(m: &Array2<f64>) -> bool {
    m.iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;

    #[test]
    fn solve_simple_system() {
        let a = array![[2.0, 1.0], [1.0, 3.0]];
        let b = array![3.0, 5.0];
        let x = solve_linear_system(&a, &b).unwrap();
        assert_relative_eq!(x[0], 0.8, epsilon = 1e-12);
        assert_relative_eq!(x[1], 1.4, epsilon = 1e-12);
    }

    #[test]
    fn solve_needs_pivoting() {
        let a = array![[0.0, 1.0], [1.0, 0.0]];
        let b = array![2.0, 3.0];
        let x = solve_linear_system(&a, &b).unwrap();
        assert_relative_eq!(x[0], 3.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn singular_system_errors() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        let b = array![1.0, 2.0];
        assert_eq!(solve_linear_system(&a, &b), Err(MathError::SingularPivot { column: 1 }));
    }

    #[test]
    fn zero_leading_column_reports_first_pivot() {
        let a = array![[0.0, 1.0, 2.0], [0.0, 3.0, 1.0], [0.0, 2.0, 5.0]];
        let b = array![1.0, 2.0, 3.0];
        assert_eq!(solve_linear_system(&a, &b), Err(MathError::SingularPivot { column: 0 }));
    }

    #[test]
    fn three_by_three_with_row_swaps() {
        let a = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 10.0]];
        let b = array![6.0, 15.0, 25.0];
        let x = solve_linear_system(&a, &b).unwrap();
        for (lhs, rhs) in a.dot(&x).iter().zip(&b) {
            assert_relative_eq!(*lhs, *rhs, epsilon = 1e-10);
        }
        for v in x {
            assert_relative_eq!(v, 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn nan_matrix_errors() {
        let a = array![[f64::NAN, 0.0], [0.0, 1.0]];
        let b = array![1.0, 1.0];
        assert_eq!(solve_linear_system(&a, &b), Err(MathError::SingularPivot { column: 0 }));
    }

    #[test]
    fn quad_form_diagonal() {
        let w = array![0.5, 0.5];
        let sigma = array![[0.04, 0.0], [0.0, 0.09]];
        assert_relative_eq!(quad_form(&w, &sigma).unwrap(), 0.0325, epsilon = 1e-12);
        assert!(quad_form(&array![1.0], &sigma).is_err());
    }

    #[test]
    fn symmetrize_averages_transpose() {
        let m = array![[1.0, 2.0], [4.0, 3.0]];
        let s = symmetrize(&m);
        assert_eq!(s, array![[1.0, 3.0], [3.0, 3.0]]);
        assert!(is_finite_matrix(&s));
    }
}
