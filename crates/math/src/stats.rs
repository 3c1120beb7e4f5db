//! Sample statistics.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::MathError;

/// Trading days per year used for annualization.
pub const TRADING_DAYS: f64 = 252.0;

/// Standard deviations at or below this are treated as zero.
pub const MIN_STD_THRESHOLD: f64 = 1e-12;

/// Arithmetic mean, `None` for an empty slice.
#[must_use]
pub fn mean(data: ArrayView1<'_, f64>) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.sum() / data.len() as f64)
}

/// Sample standard deviation with `ddof = 1`.
///
/// Returns `None` when fewer than two values are given.
#[must_use]
pub fn sample_std(data: ArrayView1<'_, f64>) -> Option<f64> {
    let n = data.len();
    if n < 2 {
        return None;
    }
    let m = mean(data)?;
    let ss: f64 = data.iter().map(|x| (x - m).powi(2)).sum();
    Some((ss / (n - 1) as f64).sqrt())
}

/// Sample covariance of the columns of `data` (rows are observations), `ddof = 1`.
///
/// # Errors
/// Returns `MathError::InsufficientData` with fewer than two rows.
pub fn sample_covariance(data: ArrayView2<'_, f64>) -> Result<Array2<f64>, MathError> {
    let n = data.nrows();
    if n < 2 {
        return Err(MathError::InsufficientData { required: 2, actual: n });
    }
    let means: Array1<f64> = data.mean_axis(Axis(0)).ok_or(MathError::EmptyData)?;
    let centered = &data - &means.insert_axis(Axis(0));
    Ok(centered.t().dot(&centered) / (n - 1) as f64)
}

/// Convert a covariance matrix to a correlation matrix.
///
/// Entries involving a zero-variance asset are set to zero, the diagonal to one.
#[must_use]
pub fn correlation_from_covariance(cov: &Array2<f64>) -> Array2<f64> {
    let n = cov.nrows();
    let std: Array1<f64> = cov.diag().mapv(|v| v.max(0.0).sqrt());
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            1.0
        } else if std[i] <= MIN_STD_THRESHOLD || std[j] <= MIN_STD_THRESHOLD {
            0.0
        } else {
            cov[[i, j]] / (std[i] * std[j])
        }
    })
}
