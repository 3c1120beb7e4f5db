//! Clipping operations for outlier handling.

use ndarray::{Array, Dimension};

use crate::MathError;

/// Clip every value into `[lower, upper]`.
///
/// NaN values are left untouched. Infinite values are clipped like any other.
#[must_use]
pub fn clip<D: Dimension>(data: &Array<f64, D>, lower: f64, upper: f64) -> Array<f64, D> {
    data.mapv(|x| if x.is_nan() { x } else { x.clamp(lower, upper) })
}

/// Clipping configuration and transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clipper {
    lower: f64,
    upper: f64,
}

impl Clipper {
    /// Create a new clipper.
    ///
    /// # Errors
    /// Returns `MathError::InvalidRange` if the bounds are not finite or `lower > upper`.
    pub fn new(lower: f64, upper: f64) -> Result<Self, MathError> {
        if !lower.is_finite() || !upper.is_finite() || lower > upper {
            return Err(MathError::InvalidRange { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    /// Lower bound.
    #[must_use]
    pub const fn lower(&self) -> f64 {
        self.lower
    }

    /// Upper bound.
    #[must_use]
    pub const fn upper(&self) -> f64 {
        self.upper
    }

    /// Apply clipping to an array of any dimension.
    #[must_use]
    pub fn apply<D: Dimension>(&self, data: &Array<f64, D>) -> Array<f64, D> {
        clip(data, self.lower, self.upper)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::{Array1, array};
    use rstest::rstest;

    use super::*;

    #[test]
    fn clip_bounds_extremes() {
        let data = array![-0.9, -0.1, 0.0, 0.4, 3.0];
        let result = clip(&data, -0.5, 1.0);
        assert_relative_eq!(result[0], -0.5);
        assert_relative_eq!(result[1], -0.1);
        assert_relative_eq!(result[4], 1.0);
    }

    #[test]
    fn clip_handles_nan_and_inf() {
        let data = array![f64::NAN, f64::INFINITY, f64::NEG_INFINITY];
        let result = clip(&data, -0.5, 1.0);
        assert!(result[0].is_nan());
        assert_eq!(result[1], 1.0);
        assert_eq!(result[2], -0.5);
    }

    #[test]
    fn clip_matrix() {
        let data = array![[2.0, -2.0], [0.1, 0.2]];
        let result = Clipper::new(-0.5, 1.0).unwrap().apply(&data);
        assert_eq!(result, array![[1.0, -0.5], [0.1, 0.2]]);
    }

    #[test]
    fn clip_is_idempotent() {
        let data = array![-3.0, 0.2, 5.0];
        let once = clip(&data, -0.5, 1.0);
        assert_eq!(clip(&once, -0.5, 1.0), once);
    }

    #[rstest]
    #[case(1.0, -1.0)]
    #[case(f64::NAN, 1.0)]
    #[case(0.0, f64::INFINITY)]
    fn invalid_range_errors(#[case] lower: f64, #[case] upper: f64) {
        assert!(Clipper::new(lower, upper).is_err());
    }

    #[test]
    fn clip_empty_array() {
        let data: Array1<f64> = array![];
        assert!(clip(&data, 0.0, 1.0).is_empty());
    }
}
