//! Optimization method and result types.

use std::str::FromStr;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::{PrimitivesError, Symbol, Weights};

/// Objective of a single-period allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationMethod {
    /// Maximize excess return over volatility.
    #[default]
    MaxSharpe,
    /// Minimize portfolio variance.
    MinVolatility,
}

impl OptimizationMethod {
    /// Canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MaxSharpe => "max_sharpe",
            Self::MinVolatility => "min_volatility",
        }
    }
}

impl std::fmt::Display for OptimizationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptimizationMethod {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max_sharpe" => Ok(Self::MaxSharpe),
            "min_volatility" => Ok(Self::MinVolatility),
            other => Err(PrimitivesError::UnknownMethod(other.to_string())),
        }
    }
}

/// Annualized performance of an allocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioPerformance {
    /// Expected annual return.
    pub annual_return: f64,
    /// Annual volatility.
    pub annual_volatility: f64,
    /// Sharpe ratio against the configured risk-free rate.
    pub sharpe_ratio: f64,
}

impl PortfolioPerformance {
    /// Whether all three figures are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.annual_return.is_finite()
            && self.annual_volatility.is_finite()
            && self.sharpe_ratio.is_finite()
    }
}

/// Which branch of the escalation chain produced the weights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationSource {
    /// A named solver returned valid weights.
    Solver(String),
    /// Every solver failed and equal weights were used.
    EqualWeightFallback,
    /// A solver returned all-zero weights and the caller substituted equal weights.
    ZeroWeightGuard,
}

impl std::fmt::Display for AllocationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Solver(name) => write!(f, "solver:{name}"),
            Self::EqualWeightFallback => f.write_str("equal_weight_fallback"),
            Self::ZeroWeightGuard => f.write_str("zero_weight_guard"),
        }
    }
}

/// Output of one optimization call.
///
/// `weights`, `mu` and the covariance rows share one ticker ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    /// Allocation weights.
    pub weights: Weights,
    /// Annualized performance.
    pub performance: PortfolioPerformance,
    /// Expected-return vector.
    pub mu: Array1<f64>,
    /// Regularized covariance matrix.
    pub covariance: Array2<f64>,
    /// Branch that produced the weights.
    pub source: AllocationSource,
}

impl OptimizationResult {
    /// Tickers shared by weights, mu and covariance.
    #[must_use]
    pub fn tickers(&self) -> &[Symbol] {
        self.weights.tickers()
    }
}
