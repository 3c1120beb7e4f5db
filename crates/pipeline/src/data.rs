//! Loading configured inputs.

use factorfolio_primitives::{FactorObservation, ReturnMatrix};
use factorfolio_traits::PanelSource;
use factorfolio_utils::{CsvPanelSource, panel_from_frame, read_csv, return_matrix_from_frame};
use tracing::info;

use crate::{PipelineConfig, PipelineError};

/// Read observations from any panel source with the configured columns.
///
/// # Errors
/// Returns `PipelineError::Source` if the source fails and
/// `PipelineError::Utils` for missing columns or bad dates.
pub fn load_panel_from(
    source: &dyn PanelSource,
    config: &PipelineConfig,
) -> Result<Vec<FactorObservation>, PipelineError> {
    let frame = source.load()?;
    let panel = panel_from_frame(&frame, &config.data.panel_columns())?;
    info!(rows = panel.len(), factor = config.data.factor(), "panel loaded");
    Ok(panel)
}

/// Read the panel CSV named by `[data] panel`.
///
/// # Errors
/// Returns `PipelineError::MissingInput` when no panel is configured,
/// otherwise as [`load_panel_from`].
pub fn load_panel(config: &PipelineConfig) -> Result<Vec<FactorObservation>, PipelineError> {
    let path = config.data.panel.as_ref().ok_or(PipelineError::MissingInput("panel path"))?;
    load_panel_from(&CsvPanelSource::new(path), config)
}

/// Read the wide return CSV named by `[data] returns`.
///
/// # Errors
/// Returns `PipelineError::MissingInput` when no return file is configured
/// and `PipelineError::Utils` if it cannot be read.
pub fn load_returns(config: &PipelineConfig) -> Result<ReturnMatrix, PipelineError> {
    let path = config.data.returns.as_ref().ok_or(PipelineError::MissingInput("returns path"))?;
    let matrix = return_matrix_from_frame(&read_csv(path)?)?;
    info!(rows = matrix.n_rows(), tickers = matrix.n_cols(), "returns loaded");
    Ok(matrix)
}
