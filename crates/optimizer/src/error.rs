//! Error types for allocation optimization.

use factorfolio_math::MathError;
use factorfolio_primitives::PrimitivesError;
use factorfolio_traits::SolverError;

/// Errors surfaced by the optimizer.
///
/// Solver failures are normally absorbed by escalation and the equal-weight
/// fallback; only structurally invalid requests reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    /// Method name not recognised.
    #[error("unknown optimization method: {0}")]
    UnknownMethod(String),

    /// Too few rows left after cleaning.
    #[error("insufficient data after cleaning: need at least {required} rows, got {actual}")]
    InsufficientData {
        /// Minimum number of rows.
        required: usize,
        /// Rows left after cleaning.
        actual: usize,
    },

    /// Return matrix has no assets.
    #[error("return matrix has no assets")]
    EmptyUniverse,

    /// No fully-invested portfolio of this universe fits the weight bounds.
    #[error("weight bounds [{lower}, {upper}] admit no portfolio of {n_assets} assets")]
    InfeasibleBounds {
        /// Number of assets.
        n_assets: usize,
        /// Lower weight bound.
        lower: f64,
        /// Upper weight bound.
        upper: f64,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Solver error.
    #[error("solver error: {0}")]
    Solver(#[from] SolverError),

    /// Math error.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// Primitive construction error.
    #[error("primitive error: {0}")]
    Primitives(#[from] PrimitivesError),
}

impl OptimizeError {
    /// Returns whether this error is recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Solver(e) => e.is_recoverable(),
            Self::Math(e) => e.is_recoverable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = OptimizeError::InsufficientData { required: 252, actual: 100 };
        assert_eq!(
            err.to_string(),
            "insufficient data after cleaning: need at least 252 rows, got 100"
        );
    }

    #[test]
    fn structural_errors_are_fatal() {
        assert!(!OptimizeError::UnknownMethod("foo".into()).is_recoverable());
        assert!(!OptimizeError::InsufficientData { required: 252, actual: 1 }.is_recoverable());
        assert!(
            !OptimizeError::InfeasibleBounds { n_assets: 1, lower: 0.0, upper: 0.5 }
                .is_recoverable()
        );
        assert!(OptimizeError::Solver(SolverError::NotConverged { iterations: 10 }).is_recoverable());
    }
}
