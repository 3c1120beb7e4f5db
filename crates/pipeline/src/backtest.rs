//! Backtest grid over portfolio modes and groups.

use factorfolio_backtest::{FormationOutput, PortfolioFormer, compute_performance_by_group};
use factorfolio_primitives::{Date, FactorObservation, PerformanceReport, PortfolioMode};
use factorfolio_traits::ResultSink;
use factorfolio_utils::{performance_to_frame, positions_to_frame};
use polars::prelude::*;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::{PipelineConfig, PipelineError};

/// Performance of one (group, mode, factor) combination.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRun {
    /// Group label, `None` for an ungrouped panel.
    pub group: Option<String>,
    /// Portfolio mode.
    pub mode: PortfolioMode,
    /// Factor label.
    pub factor: String,
    /// Daily series and statistics.
    pub report: PerformanceReport,
}

impl BacktestRun {
    /// Table name for this run's daily series.
    #[must_use]
    pub fn table_name(&self) -> String {
        match &self.group {
            Some(group) => format!("performance_{}_{}", group.to_lowercase(), self.mode),
            None => format!("performance_{}", self.mode),
        }
    }
}

/// Formation output and per-group runs of one mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeBacktest {
    /// Portfolio mode.
    pub mode: PortfolioMode,
    /// Positions and selected return matrix.
    pub formation: FormationOutput,
    /// One run per group.
    pub runs: Vec<BacktestRun>,
}

/// Output of [`run_backtests`].
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResults {
    /// First date kept after start alignment.
    pub start: Option<Date>,
    /// Results in configured mode order.
    pub modes: Vec<ModeBacktest>,
}

impl BacktestResults {
    /// Every run, mode by mode.
    pub fn runs(&self) -> impl Iterator<Item = &BacktestRun> + '_ {
        self.modes.iter().flat_map(|m| m.runs.iter())
    }

    /// The run for `group` and `mode`, if any.
    #[must_use]
    pub fn run(&self, group: Option<&str>, mode: PortfolioMode) -> Option<&BacktestRun> {
        self.runs().find(|r| r.mode == mode && r.group.as_deref() == group)
    }

    /// One row of statistics per run.
    ///
    /// # Errors
    /// Returns `PipelineError::Polars` if the frame cannot be built.
    pub fn summary_frame(&self) -> Result<DataFrame, PipelineError> {
        let runs: Vec<&BacktestRun> = self.runs().collect();
        let stat = |f: fn(&BacktestRun) -> f64| runs.iter().map(|r| f(r)).collect::<Vec<_>>();
        Ok(DataFrame::new(vec![
            Column::new("group".into(), runs.iter().map(|r| r.group.clone()).collect::<Vec<_>>()),
            Column::new("mode".into(), runs.iter().map(|r| r.mode.label()).collect::<Vec<_>>()),
            Column::new("factor".into(), runs.iter().map(|r| r.factor.as_str()).collect::<Vec<_>>()),
            Column::new("cumulative_return".into(), stat(|r| r.report.stats.cumulative_return)),
            Column::new("sharpe_ratio".into(), stat(|r| r.report.stats.sharpe_ratio)),
            Column::new("volatility".into(), stat(|r| r.report.stats.volatility)),
            Column::new("max_drawdown".into(), stat(|r| r.report.stats.max_drawdown)),
        ])?)
    }

    /// Write positions per mode, a daily series per run and the summary.
    ///
    /// # Errors
    /// Returns the first sink or frame error.
    pub fn write_to(&self, sink: &mut dyn ResultSink) -> Result<(), PipelineError> {
        for mode in &self.modes {
            let mut positions = positions_to_frame(&mode.formation.positions)?;
            sink.write(&format!("positions_{}", mode.mode), &mut positions)?;
            for run in &mode.runs {
                let mut series = performance_to_frame(&run.report.series)?;
                sink.write(&run.table_name(), &mut series)?;
            }
        }
        sink.write("backtest_summary", &mut self.summary_frame()?)?;
        Ok(())
    }
}

/// First date on which `group` is observed.
///
/// # Errors
/// Returns `PipelineError::UnknownGroup` if no observation carries `group`.
pub fn group_start(panel: &[FactorObservation], group: &str) -> Result<Date, PipelineError> {
    panel
        .iter()
        .filter(|o| o.group.as_deref() == Some(group))
        .map(|o| o.date)
        .min()
        .ok_or_else(|| PipelineError::UnknownGroup(group.to_string()))
}

fn backtest_mode(
    panel: &[FactorObservation],
    config: &PipelineConfig,
    mode: PortfolioMode,
) -> Result<ModeBacktest, PipelineError> {
    let formation = PortfolioFormer::with_config(config.formation.for_mode(mode)).form(panel)?;
    let factor = config.data.factor().to_string();
    let runs = compute_performance_by_group(&formation.positions)
        .into_iter()
        .map(|(group, report)| BacktestRun { group, mode, factor: factor.clone(), report })
        .collect();
    Ok(ModeBacktest { mode, formation, runs })
}

/// Form portfolios and measure performance for every configured mode.
///
/// Modes run in parallel. With `align_start_to` set, observations before
/// the first date of that group are dropped for all groups.
///
/// # Errors
/// Returns `PipelineError::UnknownGroup` for an unobserved alignment
/// group and `PipelineError::Backtest` if formation fails.
pub fn run_backtests(
    panel: &[FactorObservation],
    config: &PipelineConfig,
) -> Result<BacktestResults, PipelineError> {
    let (panel, start) = match &config.formation.align_start_to {
        Some(group) => {
            let start = group_start(panel, group)?;
            let kept: Vec<FactorObservation> =
                panel.iter().filter(|o| o.date >= start).cloned().collect();
            info!(%start, group = group.as_str(), dropped = panel.len() - kept.len(), "start aligned");
            (kept, Some(start))
        }
        None => (panel.to_vec(), panel.iter().map(|o| o.date).min()),
    };

    let modes = config
        .formation
        .modes
        .par_iter()
        .map(|&mode| backtest_mode(&panel, config, mode))
        .collect::<Result<Vec<_>, _>>()?;

    for mode in &modes {
        if mode.formation.is_empty() {
            warn!(mode = %mode.mode, "no portfolio formed");
        }
        for run in &mode.runs {
            info!(
                mode = %run.mode,
                group = ?run.group,
                factor = %run.factor,
                sharpe = run.report.stats.sharpe_ratio,
                cumulative = run.report.stats.cumulative_return,
                "backtest finished"
            );
        }
    }

    Ok(BacktestResults { start, modes })
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    fn date(d: u32) -> Date {
        Date::from_ymd_opt(2024, 3, d).unwrap()
    }

    /// Ten tickers per date in each present group; higher score, higher return.
    fn panel() -> Vec<FactorObservation> {
        let mut panel = Vec::new();
        for d in 1..=4 {
            for i in 0..10 {
                let score = i as f64;
                panel.push(
                    FactorObservation::new(date(d), format!("EQ{i}"), Some(score), Some(0.001 * score))
                        .with_group("Equity"),
                );
                if d >= 3 {
                    panel.push(
                        FactorObservation::new(
                            date(d),
                            format!("C{i}-USD"),
                            Some(score),
                            Some(0.002 * score),
                        )
                        .with_group("Crypto"),
                    );
                }
            }
        }
        panel
    }

    #[test]
    fn runs_every_mode_and_group() {
        let results = run_backtests(&panel(), &PipelineConfig::default()).unwrap();
        assert_eq!(results.modes.len(), 2);
        assert_eq!(results.modes[0].mode, PortfolioMode::LongShort);
        assert_eq!(results.runs().count(), 4);

        let run = results.run(Some("Equity"), PortfolioMode::LongShort).unwrap();
        assert_eq!(run.factor, "factor_score");
        assert_eq!(run.report.series.len(), 4);
        // long EQ8, EQ9 at +0.5, short EQ0, EQ1 at -0.5
        let expected = 0.5 * (0.008 + 0.009) - 0.5 * (0.0 + 0.001);
        assert!((run.report.series.returns()[0] - expected).abs() < 1e-12);
        assert_eq!(run.table_name(), "performance_equity_long_short");
    }

    #[traced_test]
    #[test]
    fn start_alignment_drops_earlier_dates() {
        let mut config = PipelineConfig::default();
        config.formation.align_start_to = Some("Crypto".to_string());
        let results = run_backtests(&panel(), &config).unwrap();
        assert_eq!(results.start, Some(date(3)));
        let equity = results.run(Some("Equity"), PortfolioMode::LongOnly).unwrap();
        assert_eq!(equity.report.series.dates(), vec![date(3), date(4)]);
        assert!(logs_contain("start aligned"));
    }

    #[test]
    fn unknown_alignment_group_is_an_error() {
        let mut config = PipelineConfig::default();
        config.formation.align_start_to = Some("Bonds".to_string());
        let err = run_backtests(&panel(), &config).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownGroup(g) if g == "Bonds"));
    }

    #[test]
    fn summary_has_one_row_per_run() {
        let results = run_backtests(&panel(), &PipelineConfig::default()).unwrap();
        let summary = results.summary_frame().unwrap();
        assert_eq!(summary.shape(), (4, 7));
    }

    #[traced_test]
    #[test]
    fn empty_panel_yields_zero_performance() {
        let results = run_backtests(&[], &PipelineConfig::default()).unwrap();
        assert_eq!(results.start, None);
        assert!(results.runs().next().is_none());
        assert!(results.modes.iter().all(|m| m.formation.is_empty()));
        assert!(logs_contain("no portfolio formed"));
    }
}
