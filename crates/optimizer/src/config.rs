//! Optimizer configuration.

use factorfolio_traits::WeightBounds;
use serde::{Deserialize, Serialize};

use crate::{CleaningPolicy, OptimizeError, ReturnEstimator};

const fn default_min_observations() -> usize {
    252
}

const fn default_clip_lower() -> f64 {
    -0.5
}

const fn default_clip_upper() -> f64 {
    1.0
}

const fn default_regularization() -> f64 {
    0.1
}

const fn default_risk_free_rate() -> f64 {
    0.02
}

const fn default_diagonal_fill() -> f64 {
    0.01
}

const fn default_diagonal_floor() -> f64 {
    0.001
}

const fn default_fallback_volatility_floor() -> f64 {
    0.01
}

/// Configuration for the robust allocation optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Minimum rows remaining after cleaning.
    #[serde(default = "default_min_observations")]
    pub min_observations: usize,
    /// Lower clip bound for daily returns.
    #[serde(default = "default_clip_lower")]
    pub clip_lower: f64,
    /// Upper clip bound for daily returns.
    #[serde(default = "default_clip_upper")]
    pub clip_upper: f64,
    /// Multiple of the identity added to the annualized covariance.
    #[serde(default = "default_regularization")]
    pub regularization: f64,
    /// Per-asset weight bounds.
    #[serde(default)]
    pub bounds: WeightBounds,
    /// Annual risk-free rate for Sharpe ratios.
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
    /// Expected-return estimator.
    #[serde(default)]
    pub estimator: ReturnEstimator,
    /// Variance used for NaN entries of the diagonal fallback covariance.
    #[serde(default = "default_diagonal_fill")]
    pub diagonal_fill: f64,
    /// Minimum variance of the diagonal fallback covariance.
    #[serde(default = "default_diagonal_floor")]
    pub diagonal_floor: f64,
    /// Volatility used by the equal-weight fallback when the estimate is zero or NaN.
    #[serde(default = "default_fallback_volatility_floor")]
    pub fallback_volatility_floor: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            min_observations: default_min_observations(),
            clip_lower: default_clip_lower(),
            clip_upper: default_clip_upper(),
            regularization: default_regularization(),
            bounds: WeightBounds::default(),
            risk_free_rate: default_risk_free_rate(),
            estimator: ReturnEstimator::default(),
            diagonal_fill: default_diagonal_fill(),
            diagonal_floor: default_diagonal_floor(),
            fallback_volatility_floor: default_fallback_volatility_floor(),
        }
    }
}

impl OptimizerConfig {
    /// Cleaning policy built from the clip bounds.
    ///
    /// # Errors
    /// Returns `OptimizeError::Math` if the clip bounds are invalid.
    pub fn cleaning(&self) -> Result<CleaningPolicy, OptimizeError> {
        CleaningPolicy::new(self.clip_lower, self.clip_upper)
    }

    /// Check parameter ranges.
    ///
    /// # Errors
    /// Returns `OptimizeError::InvalidConfig` for negative regularization,
    /// inverted bounds or a non-positive volatility floor.
    pub fn validate(&self) -> Result<(), OptimizeError> {
        self.cleaning()?;
        if !(self.regularization >= 0.0) {
            return Err(OptimizeError::InvalidConfig(format!(
                "regularization must be non-negative, got {}",
                self.regularization
            )));
        }
        if !(self.bounds.lower <= self.bounds.upper) {
            return Err(OptimizeError::InvalidConfig(format!(
                "weight bounds inverted: [{}, {}]",
                self.bounds.lower, self.bounds.upper
            )));
        }
        if !(self.fallback_volatility_floor > 0.0) {
            return Err(OptimizeError::InvalidConfig(
                "fallback volatility floor must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
