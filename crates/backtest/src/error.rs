//! Error types for portfolio formation and performance.

use factorfolio_math::MathError;
use factorfolio_primitives::{Date, PrimitivesError};

/// Errors that can occur during backtesting.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    /// Quantile outside (0, 1].
    #[error("invalid quantile: {0} (must be in (0, 1])")]
    InvalidQuantile(f64),

    /// Partition below the minimum size under the `Fail` policy.
    #[error("insufficient data on {date} (group {group:?}): need {required} scored assets, got {actual}")]
    InsufficientData {
        /// Partition date.
        date: Date,
        /// Partition group.
        group: Option<String>,
        /// Minimum partition size.
        required: usize,
        /// Scored assets found.
        actual: usize,
    },

    /// Invalid rolling window.
    #[error("invalid rolling window: {0}")]
    InvalidWindow(usize),

    /// Primitive construction error.
    #[error("primitive error: {0}")]
    Primitives(#[from] PrimitivesError),

    /// Math error.
    #[error("math error: {0}")]
    Math(#[from] MathError),
}

impl BacktestError {
    /// Returns whether this error is recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}
