//! Formation configuration and policies.

use factorfolio_primitives::PortfolioMode;
use serde::{Deserialize, Serialize};

use crate::BacktestError;

/// What to do with a partition that has too few scored assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsufficientDataPolicy {
    /// Skip the partition and continue.
    #[default]
    Skip,
    /// Abort formation with `BacktestError::InsufficientData`.
    Fail,
}

/// Ordering of assets with equal factor scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Keep panel input order (stable sort).
    #[default]
    InputOrder,
    /// Lexically smaller ticker ranks first.
    TickerAscending,
}

const fn default_quantile() -> f64 {
    0.2
}

const fn default_min_partition_size() -> usize {
    5
}

/// Configuration for quantile portfolio formation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormationConfig {
    /// Fraction of each partition selected per leg, in (0, 1].
    #[serde(default = "default_quantile")]
    pub quantile: f64,
    /// Long/short or long-only.
    #[serde(default)]
    pub mode: PortfolioMode,
    /// Minimum number of scored assets for a partition to be formed.
    #[serde(default = "default_min_partition_size")]
    pub min_partition_size: usize,
    /// Handling of partitions below `min_partition_size`.
    #[serde(default)]
    pub on_insufficient_data: InsufficientDataPolicy,
    /// Ordering of equal scores.
    #[serde(default)]
    pub tie_break: TieBreak,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            quantile: default_quantile(),
            mode: PortfolioMode::default(),
            min_partition_size: default_min_partition_size(),
            on_insufficient_data: InsufficientDataPolicy::default(),
            tie_break: TieBreak::default(),
        }
    }
}

impl FormationConfig {
    /// Same configuration with another mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: PortfolioMode) -> Self {
        self.mode = mode;
        self
    }

    /// Same configuration with another quantile.
    #[must_use]
    pub const fn with_quantile(mut self, quantile: f64) -> Self {
        self.quantile = quantile;
        self
    }

    /// Check parameter ranges.
    ///
    /// # Errors
    /// Returns `BacktestError::InvalidQuantile` unless `0 < quantile ≤ 1`.
    pub fn validate(&self) -> Result<(), BacktestError> {
        if !(self.quantile > 0.0 && self.quantile <= 1.0) {
            return Err(BacktestError::InvalidQuantile(self.quantile));
        }
        Ok(())
    }
}
