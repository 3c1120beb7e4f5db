//! Allocation run: preparation, optimisation, guard and risk decomposition.

use factorfolio_optimizer::{FrontierPoint, PortfolioOptimizer, equal_weight_performance};
use factorfolio_primitives::{AllocationSource, OptimizationResult, ReturnMatrix, Weights};
use factorfolio_risk::{RiskContribution, risk_contribution_by_ticker};
use factorfolio_traits::ResultSink;
use factorfolio_utils::{PreparationReport, prepare_returns, weights_to_frame};
use polars::prelude::*;
use tracing::{info, warn};

use crate::{PipelineConfig, PipelineError};

/// Fewest assets an allocation is attempted with.
pub const MIN_ALLOCATION_ASSETS: usize = 2;

/// Everything an allocation run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationOutcome {
    /// What preparation dropped and filled.
    pub preparation: PreparationReport,
    /// Weights, performance and estimates.
    pub result: OptimizationResult,
    /// Risk share per ticker, in weight order.
    pub risk: Vec<RiskContribution>,
}

impl AllocationOutcome {
    /// Ticker, weight and risk-share columns.
    ///
    /// # Errors
    /// Returns `PipelineError::Polars` if the frame cannot be built.
    pub fn risk_frame(&self) -> Result<DataFrame, PipelineError> {
        Ok(DataFrame::new(vec![
            Column::new(
                "ticker".into(),
                self.risk.iter().map(|r| r.ticker.as_str()).collect::<Vec<_>>(),
            ),
            Column::new("weight".into(), self.risk.iter().map(|r| r.weight).collect::<Vec<_>>()),
            Column::new(
                "risk_contribution".into(),
                self.risk.iter().map(|r| r.contribution).collect::<Vec<_>>(),
            ),
        ])?)
    }

    /// One-row frame with the annualised performance and its source.
    ///
    /// # Errors
    /// Returns `PipelineError::Polars` if the frame cannot be built.
    pub fn performance_frame(&self) -> Result<DataFrame, PipelineError> {
        let p = self.result.performance;
        let source = self.result.source.to_string();
        Ok(df! {
            "expected_annual_return" => [p.annual_return],
            "annual_volatility" => [p.annual_volatility],
            "sharpe_ratio" => [p.sharpe_ratio],
            "source" => [source.as_str()],
        }?)
    }

    /// Write weights, risk contributions and performance.
    ///
    /// # Errors
    /// Returns the first sink or frame error.
    pub fn write_to(&self, sink: &mut dyn ResultSink) -> Result<(), PipelineError> {
        sink.write("weights", &mut weights_to_frame(&self.result.weights)?)?;
        sink.write("risk_contribution", &mut self.risk_frame()?)?;
        sink.write("allocation_performance", &mut self.performance_frame()?)?;
        Ok(())
    }
}

/// Replace an all-zero allocation with equal weights over `returns`.
pub(crate) fn guard_zero_weights(
    result: OptimizationResult,
    returns: &ReturnMatrix,
    config: &PipelineConfig,
) -> OptimizationResult {
    if !result.weights.is_all_zero() {
        return result;
    }
    warn!(assets = result.weights.len(), "optimizer returned all-zero weights, using equal weights");
    let settings = &config.optimizer.config;
    OptimizationResult {
        weights: Weights::equal(result.weights.tickers().to_vec()),
        performance: equal_weight_performance(
            returns.values(),
            settings.risk_free_rate,
            settings.fallback_volatility_floor,
        ),
        source: AllocationSource::ZeroWeightGuard,
        ..result
    }
}

fn prepared(
    matrix: &ReturnMatrix,
    config: &PipelineConfig,
) -> Result<(ReturnMatrix, PreparationReport), PipelineError> {
    let (prepared, report) = prepare_returns(matrix, &config.preparation)?;
    if prepared.n_cols() < MIN_ALLOCATION_ASSETS {
        return Err(PipelineError::TooFewAssets {
            required: MIN_ALLOCATION_ASSETS,
            actual: prepared.n_cols(),
        });
    }
    Ok((prepared, report))
}

/// [`run_allocation`] with a caller-built optimizer.
///
/// The optimizer's own configuration is used in place of `[optimizer]`;
/// the method still comes from `config`.
///
/// # Errors
/// As [`run_allocation`].
pub fn run_allocation_with(
    optimizer: &PortfolioOptimizer,
    matrix: &ReturnMatrix,
    config: &PipelineConfig,
) -> Result<AllocationOutcome, PipelineError> {
    let (returns, preparation) = prepared(matrix, config)?;
    let result = optimizer.optimize(&returns, config.optimizer.method)?;
    let result = guard_zero_weights(result, &returns, config);
    let risk = risk_contribution_by_ticker(&result.weights, &result.covariance)?;

    info!(
        method = %config.optimizer.method,
        source = %result.source,
        assets = result.weights.len(),
        sharpe = result.performance.sharpe_ratio,
        "allocation finished"
    );
    Ok(AllocationOutcome { preparation, result, risk })
}

/// Prepare `matrix`, optimise it and decompose the resulting risk.
///
/// # Errors
/// Returns `PipelineError::TooFewAssets` when fewer than
/// [`MIN_ALLOCATION_ASSETS`] survive preparation, `PipelineError::Optimize`
/// for structural optimisation errors such as too few rows, and
/// `PipelineError::Risk` for a zero-variance allocation.
pub fn run_allocation(
    matrix: &ReturnMatrix,
    config: &PipelineConfig,
) -> Result<AllocationOutcome, PipelineError> {
    let optimizer = PortfolioOptimizer::with_config(config.optimizer.config);
    run_allocation_with(&optimizer, matrix, config)
}

/// Efficient frontier of the prepared matrix with `[optimizer] frontier_points`.
///
/// # Errors
/// As [`run_allocation`], minus the risk decomposition.
pub fn run_frontier(
    matrix: &ReturnMatrix,
    config: &PipelineConfig,
) -> Result<Vec<FrontierPoint>, PipelineError> {
    let (returns, _) = prepared(matrix, config)?;
    let optimizer = PortfolioOptimizer::with_config(config.optimizer.config);
    let frontier = optimizer.efficient_frontier(&returns, config.optimizer.frontier_points)?;
    info!(points = frontier.len(), "frontier traced");
    Ok(frontier)
}

/// Expected return and volatility columns of a frontier.
///
/// # Errors
/// Returns `PipelineError::Polars` if the frame cannot be built.
pub fn frontier_frame(frontier: &[FrontierPoint]) -> Result<DataFrame, PipelineError> {
    Ok(DataFrame::new(vec![
        Column::new(
            "expected_return".into(),
            frontier.iter().map(|p| p.expected_return).collect::<Vec<_>>(),
        ),
        Column::new("volatility".into(), frontier.iter().map(|p| p.volatility).collect::<Vec<_>>()),
    ])?)
}
