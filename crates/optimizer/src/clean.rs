//! Return-matrix cleaning ahead of estimation.

use factorfolio_math::Clipper;
use factorfolio_primitives::ReturnMatrix;

use crate::OptimizeError;

/// Infinity to missing, drop rows with any missing value, clip.
///
/// Applying the policy to its own output returns the same matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleaningPolicy {
    lower: f64,
    upper: f64,
}

impl Default for CleaningPolicy {
    fn default() -> Self {
        Self { lower: -0.5, upper: 1.0 }
    }
}

impl CleaningPolicy {
    /// Create a policy clipping into `[lower, upper]`.
    ///
    /// # Errors
    /// Returns `OptimizeError::Math` if the bounds are invalid.
    pub fn new(lower: f64, upper: f64) -> Result<Self, OptimizeError> {
        let clipper = Clipper::new(lower, upper)?;
        Ok(Self { lower: clipper.lower(), upper: clipper.upper() })
    }

    /// Clip range.
    #[must_use]
    pub const fn bounds(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    /// Apply the policy.
    #[must_use]
    pub fn apply(&self, returns: &ReturnMatrix) -> ReturnMatrix {
        let (lower, upper) = self.bounds();
        returns
            .map_values(|&v| if v.is_infinite() { f64::NAN } else { v })
            .filter_rows(|row| row.iter().all(|v| !v.is_nan()))
            .map_values(|&v| v.clamp(lower, upper))
    }
}
