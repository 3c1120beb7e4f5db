//! Error types for primitive construction.

use thiserror::Error;

/// Errors raised when building primitive values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrimitivesError {
    /// Matrix labels do not match the value shape.
    #[error("shape mismatch: labels {rows}x{cols}, values {actual_rows}x{actual_cols}")]
    ShapeMismatch {
        /// Number of date labels.
        rows: usize,
        /// Number of ticker labels.
        cols: usize,
        /// Rows in the value array.
        actual_rows: usize,
        /// Columns in the value array.
        actual_cols: usize,
    },

    /// Vector length does not match its labels.
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Number of labels.
        expected: usize,
        /// Number of values.
        actual: usize,
    },

    /// Optimization method name not recognised.
    #[error("unknown optimization method: {0}")]
    UnknownMethod(String),
}
