//! Error types for utility functions.

use factorfolio_math::MathError;
use factorfolio_primitives::PrimitivesError;
use factorfolio_traits::SourceError;

/// Errors that can occur during utility operations.
#[derive(Debug, thiserror::Error)]
pub enum UtilsError {
    /// Polars error.
    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// File could not be read or written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Missing column.
    #[error("missing column: {0}")]
    MissingColumn(String),

    /// Date column value that is not a date.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// Primitive construction error.
    #[error("primitive error: {0}")]
    Primitives(#[from] PrimitivesError),

    /// Numerical kernel error.
    #[error("math error: {0}")]
    Math(#[from] MathError),
}

impl UtilsError {
    /// Returns whether this error is recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

impl From<UtilsError> for SourceError {
    fn from(err: UtilsError) -> Self {
        match err {
            UtilsError::Polars(e) => Self::Polars(e),
            UtilsError::Io(e) => Self::Io(e),
            other => Self::NotFound(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = UtilsError::InvalidParameter("bad value".to_string());
        assert!(err.to_string().contains("bad value"));
        assert_eq!(UtilsError::MissingColumn("date".into()).to_string(), "missing column: date");
    }
}
