//! Cleaning of a return matrix before optimisation.

use factorfolio_math::{Clipper, sample_std};
use factorfolio_primitives::ReturnMatrix;
use ndarray::Axis;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    UtilsError,
    columns::DATE,
    frames::{return_matrix_from_frame, return_matrix_to_frame},
};

/// Thresholds for [`prepare_returns`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreparationConfig {
    /// Columns whose missing share is at or above this are dropped.
    pub max_missing_pct: f64,
    /// Lower clip bound for daily returns.
    pub clip_lower: f64,
    /// Upper clip bound for daily returns.
    pub clip_upper: f64,
    /// Columns with sample std at or below this are dropped.
    pub min_std: f64,
}

impl Default for PreparationConfig {
    fn default() -> Self {
        Self { max_missing_pct: 0.5, clip_lower: -0.5, clip_upper: 1.0, min_std: 1e-6 }
    }
}

impl PreparationConfig {
    /// Check thresholds.
    ///
    /// # Errors
    /// Returns `UtilsError::InvalidParameter` for a missing share outside
    /// `(0, 1]` or a negative std floor, and `UtilsError::Math` for an
    /// invalid clip range.
    pub fn validate(&self) -> Result<(), UtilsError> {
        if !(self.max_missing_pct > 0.0 && self.max_missing_pct <= 1.0) {
            return Err(UtilsError::InvalidParameter(format!(
                "max_missing_pct must be in (0, 1], got {}",
                self.max_missing_pct
            )));
        }
        if !(self.min_std >= 0.0) {
            return Err(UtilsError::InvalidParameter(format!(
                "min_std must be non-negative, got {}",
                self.min_std
            )));
        }
        Clipper::new(self.clip_lower, self.clip_upper)?;
        Ok(())
    }
}

/// What [`prepare_returns`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparationReport {
    /// Tickers dropped for too many missing values.
    pub dropped_sparse: Vec<String>,
    /// Infinite cells turned into missing values.
    pub replaced_infinite: usize,
    /// Missing cells filled forward, backward or with zero.
    pub filled: usize,
    /// Tickers dropped for a (near) constant series.
    pub dropped_flat: Vec<String>,
}

fn keep_columns(matrix: &ReturnMatrix, keep: impl Fn(usize) -> bool) -> (ReturnMatrix, Vec<String>) {
    let (kept, dropped): (Vec<usize>, Vec<usize>) = (0..matrix.n_cols()).partition(|&j| keep(j));
    let names = dropped.iter().map(|&j| matrix.tickers()[j].as_str().to_string()).collect();
    (matrix.select_columns(&kept), names)
}

/// Forward fill, then back fill, then zero-fill every ticker column.
fn fill_gaps(matrix: &ReturnMatrix) -> Result<ReturnMatrix, UtilsError> {
    let frame = return_matrix_to_frame(matrix)?;
    let sort_options = SortMultipleOptions::new().with_maintain_order(true);
    let mut lf = frame.lazy().sort([DATE], sort_options);

    for ticker in matrix.tickers() {
        let name = ticker.as_str();
        lf = lf.with_column(
            col(name)
                .cast(DataType::Float64)
                .forward_fill(None)
                .backward_fill(None)
                .fill_null(lit(0.0))
                .alias(name),
        );
    }

    return_matrix_from_frame(&lf.collect()?)
}

/// Clean a return matrix for the optimiser.
///
/// In order: drop columns with a missing share at or above
/// `max_missing_pct`, turn `±inf` into missing, fill gaps forward then
/// backward then with zero (rows sorted by date), clip into
/// `[clip_lower, clip_upper]`, and drop columns whose sample std is at or
/// below `min_std`.
///
/// # Errors
/// Returns `UtilsError::InvalidParameter` or `UtilsError::Math` for an
/// invalid config and `UtilsError::Polars` if filling fails.
pub fn prepare_returns(
    matrix: &ReturnMatrix,
    config: &PreparationConfig,
) -> Result<(ReturnMatrix, PreparationReport), UtilsError> {
    config.validate()?;
    let clipper = Clipper::new(config.clip_lower, config.clip_upper)?;
    let mut report = PreparationReport::default();

    if matrix.n_rows() == 0 {
        report.dropped_sparse = matrix.tickers().iter().map(|t| t.as_str().to_string()).collect();
        warn!(tickers = matrix.n_cols(), "return matrix has no rows");
        return Ok((ReturnMatrix::empty(), report));
    }

    let rows = matrix.n_rows() as f64;
    let (sparse_free, dropped_sparse) = keep_columns(matrix, |j| {
        let missing = matrix.values().column(j).iter().filter(|v| v.is_nan()).count();
        (missing as f64 / rows) < config.max_missing_pct
    });
    report.dropped_sparse = dropped_sparse;
    if !report.dropped_sparse.is_empty() {
        info!(dropped = ?report.dropped_sparse, "dropped sparse tickers");
    }

    report.replaced_infinite = sparse_free.values().iter().filter(|v| v.is_infinite()).count();
    let finite = sparse_free.map_values(|&v| if v.is_infinite() { f64::NAN } else { v });

    report.filled = finite.values().iter().filter(|v| v.is_nan()).count();
    let filled = fill_gaps(&finite)?;
    debug!(replaced_infinite = report.replaced_infinite, filled = report.filled, "gaps filled");

    let (dates, tickers, values) = filled.into_parts();
    let clipped = ReturnMatrix::new(dates, tickers, clipper.apply(&values))?;

    let (prepared, dropped_flat) = keep_columns(&clipped, |j| {
        sample_std(clipped.values().index_axis(Axis(1), j)).is_some_and(|s| s > config.min_std)
    });
    report.dropped_flat = dropped_flat;
    if !report.dropped_flat.is_empty() {
        info!(dropped = ?report.dropped_flat, "dropped flat tickers");
    }

    info!(rows = prepared.n_rows(), tickers = prepared.n_cols(), "returns prepared");
    Ok((prepared, report))
}
