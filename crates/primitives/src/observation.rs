//! Factor panel observations.

use serde::{Deserialize, Serialize};

use crate::{Date, Symbol};

/// One row of the upstream factor panel.
///
/// A score or return of `None` (or NaN) is treated as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorObservation {
    /// Observation date.
    pub date: Date,
    /// Optional group key (asset class, sector, ...).
    pub group: Option<String>,
    /// Asset ticker.
    pub ticker: Symbol,
    /// Cross-sectional factor score.
    pub factor_score: Option<f64>,
    /// Realized fractional return for the date.
    pub realized_return: Option<f64>,
}

impl FactorObservation {
    /// Create an ungrouped observation.
    #[must_use]
    pub fn new(
        date: Date,
        ticker: impl Into<Symbol>,
        factor_score: Option<f64>,
        realized_return: Option<f64>,
    ) -> Self {
        Self { date, group: None, ticker: ticker.into(), factor_score, realized_return }
    }

    /// Attach a group key.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// The factor score if present and not NaN.
    ///
    /// Infinite scores are kept and rank at the extremes.
    #[must_use]
    pub fn valid_score(&self) -> Option<f64> {
        self.factor_score.filter(|s| !s.is_nan())
    }

    /// The realized return if present and not NaN.
    #[must_use]
    pub fn observed_return(&self) -> Option<f64> {
        self.realized_return.filter(|r| !r.is_nan())
    }
}
