//! Backtest performance aggregation.

use std::collections::BTreeMap;

use factorfolio_math::{MIN_STD_THRESHOLD, TRADING_DAYS, mean, sample_std};
use factorfolio_primitives::{
    Date, PerformancePoint, PerformanceReport, PerformanceSeries, PerformanceStats, PositionRow,
};
use ndarray::ArrayView1;
use tracing::warn;

use crate::BacktestError;

/// Window of the dashboard rolling Sharpe ratio, in trading days.
pub const DEFAULT_ROLLING_WINDOW: usize = 60;

/// Collapse position rows into a daily return series and its statistics.
///
/// Weighted returns are summed per date; dates are processed in ascending
/// order whatever the row order. An empty input yields an empty series and
/// all-zero statistics.
#[must_use]
pub fn compute_performance(rows: &[PositionRow]) -> PerformanceReport {
    if rows.is_empty() {
        warn!("no position rows, reporting zero performance");
        return PerformanceReport::default();
    }

    let mut daily: BTreeMap<Date, f64> = BTreeMap::new();
    for row in rows {
        *daily.entry(row.date).or_insert(0.0) += row.weighted_return;
    }
    summarize_returns(&daily)
}

/// Run [`compute_performance`] separately for each group label.
#[must_use]
pub fn compute_performance_by_group(
    rows: &[PositionRow],
) -> BTreeMap<Option<String>, PerformanceReport> {
    let mut grouped: BTreeMap<Option<String>, Vec<PositionRow>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.group.clone()).or_default().push(row.clone());
    }
    grouped.into_iter().map(|(group, rows)| (group, compute_performance(&rows))).collect()
}

/// Cumulative series and statistics of a date-keyed daily return series.
#[must_use]
pub fn summarize_returns(daily: &BTreeMap<Date, f64>) -> PerformanceReport {
    if daily.is_empty() {
        return PerformanceReport::default();
    }

    let mut growth = 1.0;
    let points: Vec<PerformancePoint> = daily
        .iter()
        .map(|(&date, &portfolio_return)| {
            growth *= 1.0 + portfolio_return;
            PerformancePoint { date, portfolio_return, cumulative: growth }
        })
        .collect();
    let series = PerformanceSeries::new(points);

    let returns = series.returns();
    let cumulative = series.cumulative();
    let view = ArrayView1::from(returns.as_slice());

    let std = sample_std(view).filter(|s| *s > MIN_STD_THRESHOLD).unwrap_or(0.0);
    let sharpe_ratio = match mean(view) {
        Some(m) if std > 0.0 => m / std * TRADING_DAYS.sqrt(),
        _ => 0.0,
    };

    let stats = PerformanceStats {
        cumulative_return: growth - 1.0,
        sharpe_ratio,
        volatility: std * TRADING_DAYS.sqrt(),
        max_drawdown: max_drawdown(&cumulative),
    };
    PerformanceReport { series, stats }
}

/// Most negative `cumulative / running_max − 1`.
fn max_drawdown(cumulative: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst: f64 = 0.0;
    for &value in cumulative {
        peak = peak.max(value);
        let drawdown = if peak > 0.0 { value / peak - 1.0 } else { -1.0 };
        worst = worst.min(drawdown);
    }
    worst
}

/// Rolling mean / std ratio of daily returns, not annualized.
///
/// Entries before the first full window, and windows with zero deviation,
/// are `None`.
///
/// # Errors
/// Returns `BacktestError::InvalidWindow` for a zero window.
pub fn rolling_sharpe(
    series: &PerformanceSeries,
    window: usize,
) -> Result<Vec<(Date, Option<f64>)>, BacktestError> {
    if window == 0 {
        return Err(BacktestError::InvalidWindow(window));
    }
    let returns = series.returns();
    Ok(series
        .points()
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let value = (i + 1 >= window).then(|| {
                let slice = ArrayView1::from(&returns[i + 1 - window..=i]);
                let std = sample_std(slice)?;
                (std > MIN_STD_THRESHOLD).then(|| mean(slice).map(|m| m / std)).flatten()
            });
            (point.date, value.flatten())
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use factorfolio_primitives::{Leg, Symbol};
    use rstest::rstest;

    use super::*;

    fn day(d: u32) -> Date {
        Date::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn row(date: Date, weighted_return: f64) -> PositionRow {
        PositionRow {
            date,
            group: None,
            ticker: Symbol::new("X"),
            leg: Leg::Long,
            factor_score: 0.0,
            realized_return: Some(weighted_return),
            position: 1.0,
            weighted_return,
        }
    }

    fn daily(returns: &[f64]) -> BTreeMap<Date, f64> {
        returns.iter().enumerate().map(|(i, r)| (day(i as u32 + 1), *r)).collect()
    }

    #[test]
    fn empty_input_gives_zero_stats() {
        let report = compute_performance(&[]);
        assert!(report.series.is_empty());
        assert_eq!(report.stats, PerformanceStats::zero());
    }

    #[test]
    fn sums_weighted_returns_per_date_in_date_order() {
        let rows = vec![row(day(3), 0.02), row(day(2), 0.01), row(day(3), -0.005), row(day(2), 0.01)];
        let report = compute_performance(&rows);

        assert_eq!(report.series.dates(), vec![day(2), day(3)]);
        let returns = report.series.returns();
        assert_relative_eq!(returns[0], 0.02, epsilon = 1e-15);
        assert_relative_eq!(returns[1], 0.015, epsilon = 1e-15);
        assert_relative_eq!(report.series.cumulative()[1], 1.02 * 1.015, epsilon = 1e-12);
    }

    #[rstest]
    #[case(&[0.01])]
    #[case(&[0.01, -0.02, 0.03])]
    #[case(&[-0.5, 0.2, 0.1, -0.05, 0.0])]
    fn cumulative_return_matches_last_point(#[case] returns: &[f64]) {
        let report = summarize_returns(&daily(returns));
        let last = report.series.last().unwrap().cumulative;
        assert_relative_eq!(report.stats.cumulative_return + 1.0, last, epsilon = 1e-12);
    }

    #[test]
    fn constant_returns_have_zero_sharpe() {
        let report = summarize_returns(&daily(&[0.001; 20]));
        assert_eq!(report.stats.sharpe_ratio, 0.0);
        assert_eq!(report.stats.volatility, 0.0);
        assert!(report.stats.cumulative_return > 0.0);
    }

    #[test]
    fn single_point_is_degenerate() {
        let report = summarize_returns(&daily(&[0.05]));
        assert_eq!(report.stats.sharpe_ratio, 0.0);
        assert_eq!(report.stats.volatility, 0.0);
        assert_relative_eq!(report.stats.cumulative_return, 0.05, epsilon = 1e-12);
        assert_eq!(report.stats.max_drawdown, 0.0);
    }

    #[test]
    fn sharpe_and_volatility_annualized() {
        let report = summarize_returns(&daily(&[0.01, 0.03]));
        let std = 0.02_f64.sqrt() / 10.0;
        assert_relative_eq!(report.stats.volatility, std * 252.0_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(report.stats.sharpe_ratio, 0.02 / std * 252.0_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn max_drawdown_peak_to_trough() {
        let report = summarize_returns(&daily(&[0.1, -0.5, 0.2]));
        assert_relative_eq!(report.stats.max_drawdown, -0.5, epsilon = 1e-12);
    }

    #[test]
    fn by_group_runs_independently() {
        let mut a = row(day(2), 0.01);
        a.group = Some("Equity".into());
        let mut b = row(day(2), -0.02);
        b.group = Some("Crypto".into());

        let reports = compute_performance_by_group(&[a, b]);
        assert_eq!(reports.len(), 2);
        let crypto = &reports[&Some("Crypto".to_string())];
        assert_relative_eq!(crypto.stats.cumulative_return, -0.02, epsilon = 1e-12);
    }

    #[test]
    fn rolling_sharpe_window() {
        let report = summarize_returns(&daily(&[0.01, 0.03, 0.02, 0.02]));
        let rolling = rolling_sharpe(&report.series, 2).unwrap();

        assert_eq!(rolling.len(), 4);
        assert_eq!(rolling[0].1, None);
        let std = 0.02_f64.sqrt() / 10.0;
        assert_relative_eq!(rolling[1].1.unwrap(), 0.02 / std, epsilon = 1e-9);
        // flat window
        assert_eq!(rolling[3].1, None);
        assert!(rolling_sharpe(&report.series, 0).is_err());
    }
}
