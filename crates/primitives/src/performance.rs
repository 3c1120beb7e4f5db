//! Backtest performance series and statistics.

use serde::{Deserialize, Serialize};

use crate::Date;

/// One day of a portfolio performance series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformancePoint {
    /// Trading date.
    pub date: Date,
    /// Summed weighted return of all positions on the date.
    pub portfolio_return: f64,
    /// Running product of `1 + portfolio_return` up to and including the date.
    pub cumulative: f64,
}

/// Date-ordered daily performance of one backtest configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSeries {
    points: Vec<PerformancePoint>,
}

impl PerformanceSeries {
    /// Build a series from date-ordered points.
    #[must_use]
    pub fn new(points: Vec<PerformancePoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].date < w[1].date));
        Self { points }
    }

    /// An empty series.
    #[must_use]
    pub const fn empty() -> Self {
        Self { points: Vec::new() }
    }

    /// Number of dates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points in date order.
    #[must_use]
    pub fn points(&self) -> &[PerformancePoint] {
        &self.points
    }

    /// Daily portfolio returns in date order.
    #[must_use]
    pub fn returns(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.portfolio_return).collect()
    }

    /// Cumulative growth values in date order.
    #[must_use]
    pub fn cumulative(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.cumulative).collect()
    }

    /// Dates in order.
    #[must_use]
    pub fn dates(&self) -> Vec<Date> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// The last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&PerformancePoint> {
        self.points.last()
    }
}

/// Summary statistics of a performance series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    /// Final cumulative growth minus one.
    pub cumulative_return: f64,
    /// Annualized mean / std of daily returns (zero for degenerate series).
    pub sharpe_ratio: f64,
    /// Annualized standard deviation of daily returns.
    pub volatility: f64,
    /// Most negative peak-to-trough decline of the cumulative series.
    pub max_drawdown: f64,
}

impl PerformanceStats {
    /// The all-zero record reported for an empty backtest.
    #[must_use]
    pub const fn zero() -> Self {
        Self { cumulative_return: 0.0, sharpe_ratio: 0.0, volatility: 0.0, max_drawdown: 0.0 }
    }
}

/// Performance series together with its statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Daily series.
    pub series: PerformanceSeries,
    /// Summary statistics.
    pub stats: PerformanceStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_stats() {
        let stats = PerformanceStats::zero();
        assert_eq!(stats, PerformanceStats::default());
        assert_eq!(stats.max_drawdown, 0.0);
    }

    #[test]
    fn series_accessors() {
        let d1 = Date::from_ymd_opt(2024, 1, 2).unwrap();
        let d2 = Date::from_ymd_opt(2024, 1, 3).unwrap();
        let series = PerformanceSeries::new(vec![
            PerformancePoint { date: d1, portfolio_return: 0.01, cumulative: 1.01 },
            PerformancePoint { date: d2, portfolio_return: -0.02, cumulative: 0.9898 },
        ]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.returns(), vec![0.01, -0.02]);
        assert_eq!(series.last().map(|p| p.date), Some(d2));
        assert!(PerformanceSeries::empty().is_empty());
    }
}
