//! Pairwise-complete covariance and correlation of a return matrix.

use factorfolio_primitives::ReturnMatrix;
use ndarray::{Array2, ArrayView1};

/// Statistics of the rows where both columns are observed.
struct PairStats {
    covariance: f64,
    correlation: f64,
}

fn pair_stats(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> PairStats {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .collect();
    let n = pairs.len();
    if n < 2 {
        return PairStats { covariance: f64::NAN, correlation: f64::NAN };
    }

    let nf = n as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / nf;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / nf;
    let (sxy, sxx, syy) = pairs.iter().fold((0.0, 0.0, 0.0), |(sxy, sxx, syy), &(a, b)| {
        let (da, db) = (a - mx, b - my);
        (sxy + da * db, sxx + da * da, syy + db * db)
    });

    let denom = (sxx * syy).sqrt();
    PairStats {
        covariance: sxy / (nf - 1.0),
        correlation: if denom > 0.0 { (sxy / denom).clamp(-1.0, 1.0) } else { f64::NAN },
    }
}

fn pairwise(returns: &ReturnMatrix, pick: impl Fn(&PairStats) -> f64) -> Array2<f64> {
    let values = returns.values();
    let n = values.ncols();
    let mut out = Array2::from_elem((n, n), f64::NAN);
    for i in 0..n {
        for j in i..n {
            let v = pick(&pair_stats(values.column(i), values.column(j)));
            out[[i, j]] = v;
            out[[j, i]] = v;
        }
    }
    out
}

/// Daily sample covariance (`ddof = 1`) over rows where both assets are
/// observed. Pairs with fewer than two common rows are NaN.
#[must_use]
pub fn covariance_matrix(returns: &ReturnMatrix) -> Array2<f64> {
    pairwise(returns, |s| s.covariance)
}

/// Pearson correlation over rows where both assets are observed.
///
/// Constant columns and pairs with fewer than two common rows are NaN.
#[must_use]
pub fn correlation_matrix(returns: &ReturnMatrix) -> Array2<f64> {
    pairwise(returns, |s| s.correlation)
}
