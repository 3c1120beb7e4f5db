//! Error types for risk decomposition.

/// Errors from risk decomposition.
///
/// All variants are caller contract violations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RiskError {
    /// Portfolio variance is zero, negative or undefined.
    #[error("portfolio variance must be positive, got {0}")]
    ZeroVariance(f64),

    /// Weights and covariance disagree in size.
    #[error("dimension mismatch: {weights} weights for a {rows}x{cols} covariance matrix")]
    DimensionMismatch {
        /// Number of weights.
        weights: usize,
        /// Covariance rows.
        rows: usize,
        /// Covariance columns.
        cols: usize,
    },
}

impl RiskError {
    /// Returns whether this error is recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        false
    }
}
