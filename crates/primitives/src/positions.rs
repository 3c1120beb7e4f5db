//! Portfolio legs and signed position rows.

use serde::{Deserialize, Serialize};

use crate::{Date, Symbol};

/// Portfolio construction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortfolioMode {
    /// Dollar-neutral: long the top quantile, short the bottom quantile.
    #[default]
    LongShort,
    /// Long the top quantile only.
    LongOnly,
}

impl PortfolioMode {
    /// Whether a short leg is formed.
    #[must_use]
    pub const fn is_long_short(&self) -> bool {
        matches!(self, Self::LongShort)
    }

    /// Label used in output tables.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::LongShort => "long_short",
            Self::LongOnly => "long_only",
        }
    }
}

impl std::fmt::Display for PortfolioMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Side of a quantile portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Leg {
    /// Top-ranked assets, positive position.
    Long,
    /// Bottom-ranked assets, negative position.
    Short,
}

impl Leg {
    /// Sign applied to the equal leg weight.
    #[must_use]
    pub const fn sign(&self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Short => "short",
        }
    }
}

/// One selected asset of a formed portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRow {
    /// Formation date.
    pub date: Date,
    /// Group key of the partition, if grouped.
    pub group: Option<String>,
    /// Asset ticker.
    pub ticker: Symbol,
    /// Leg the asset belongs to.
    pub leg: Leg,
    /// Factor score used for ranking.
    pub factor_score: f64,
    /// Realized return as observed (may be missing).
    pub realized_return: Option<f64>,
    /// Signed position, `±1 / leg_size`.
    pub position: f64,
    /// `realized_return × position`, missing return counted as zero.
    pub weighted_return: f64,
}
