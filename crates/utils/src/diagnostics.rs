//! Shape and coverage summary of a factor panel.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use factorfolio_primitives::{Date, FactorObservation};
use serde::{Deserialize, Serialize};

/// Dates with fewer tickers than this are reported as thin.
pub const MIN_TICKERS_PER_DATE: usize = 10;

/// Quantile used for [`PanelDiagnostics::expected_leg_size`].
const DIAGNOSTIC_QUANTILE: f64 = 0.2;

/// Coverage statistics of a panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelDiagnostics {
    /// Number of observations.
    pub observations: usize,
    /// Distinct tickers.
    pub tickers: usize,
    /// Earliest date.
    pub first_date: Option<Date>,
    /// Latest date.
    pub last_date: Option<Date>,
    /// Distinct dates.
    pub dates: usize,
    /// Fewest tickers on any date.
    pub min_tickers_per_date: usize,
    /// Average tickers per date.
    pub mean_tickers_per_date: f64,
    /// Most tickers on any date.
    pub max_tickers_per_date: usize,
    /// Share of observations without a usable score.
    pub missing_score_share: f64,
    /// Share of observations without a realized return.
    pub missing_return_share: f64,
    /// Dates with fewer than [`MIN_TICKERS_PER_DATE`] tickers.
    pub thin_dates: Vec<Date>,
    /// Per-leg size on an average date at quantile 0.2.
    pub expected_leg_size: usize,
}

impl PanelDiagnostics {
    /// Per-leg size on an average date at `quantile`.
    #[must_use]
    pub fn leg_size_at(&self, quantile: f64) -> usize {
        (self.mean_tickers_per_date * quantile).floor() as usize
    }
}

impl fmt::Display for PanelDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "observations:       {}", self.observations)?;
        writeln!(f, "tickers:            {}", self.tickers)?;
        match (self.first_date, self.last_date) {
            (Some(first), Some(last)) => {
                writeln!(f, "date range:         {first} .. {last} ({} dates)", self.dates)?;
            }
            _ => writeln!(f, "date range:         empty")?,
        }
        writeln!(
            f,
            "tickers per date:   min {} / mean {:.1} / max {}",
            self.min_tickers_per_date, self.mean_tickers_per_date, self.max_tickers_per_date
        )?;
        writeln!(f, "missing scores:     {:.2}%", self.missing_score_share * 100.0)?;
        writeln!(f, "missing returns:    {:.2}%", self.missing_return_share * 100.0)?;
        writeln!(f, "thin dates (<{MIN_TICKERS_PER_DATE}):    {}", self.thin_dates.len())?;
        write!(f, "expected leg size:  {}", self.expected_leg_size)
    }
}

/// Summarise coverage of `panel`.
#[must_use]
pub fn inspect_panel(panel: &[FactorObservation]) -> PanelDiagnostics {
    let mut per_date: BTreeMap<Date, BTreeSet<&str>> = BTreeMap::new();
    for obs in panel {
        per_date.entry(obs.date).or_default().insert(obs.ticker.as_str());
    }
    let tickers: BTreeSet<&str> = panel.iter().map(|o| o.ticker.as_str()).collect();
    let counts: Vec<usize> = per_date.values().map(BTreeSet::len).collect();

    let share = |missing: usize| {
        if panel.is_empty() { 0.0 } else { missing as f64 / panel.len() as f64 }
    };
    let mean_tickers_per_date = if counts.is_empty() {
        0.0
    } else {
        counts.iter().sum::<usize>() as f64 / counts.len() as f64
    };

    let mut diagnostics = PanelDiagnostics {
        observations: panel.len(),
        tickers: tickers.len(),
        first_date: per_date.keys().next().copied(),
        last_date: per_date.keys().next_back().copied(),
        dates: per_date.len(),
        min_tickers_per_date: counts.iter().copied().min().unwrap_or(0),
        mean_tickers_per_date,
        max_tickers_per_date: counts.iter().copied().max().unwrap_or(0),
        missing_score_share: share(panel.iter().filter(|o| o.valid_score().is_none()).count()),
        missing_return_share: share(
            panel.iter().filter(|o| o.observed_return().is_none()).count(),
        ),
        thin_dates: per_date
            .iter()
            .filter(|(_, t)| t.len() < MIN_TICKERS_PER_DATE)
            .map(|(d, _)| *d)
            .collect(),
        expected_leg_size: 0,
    };
    diagnostics.expected_leg_size = diagnostics.leg_size_at(DIAGNOSTIC_QUANTILE);
    diagnostics
}
