//! Cross-sectional quantile portfolio formation.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use factorfolio_primitives::{
    Date, FactorObservation, Leg, PortfolioMode, PositionRow, ReturnMatrix, Symbol,
};
use ndarray::Array2;
use tracing::{debug, info, warn};

use crate::{BacktestError, FormationConfig, InsufficientDataPolicy, TieBreak};

/// Partition key: group label (if any) and date.
type PartitionKey = (Option<String>, Date);

/// Counts of what happened to each partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormationSummary {
    /// Number of `(group, date)` partitions in the panel.
    pub partitions: usize,
    /// Partitions that produced a portfolio.
    pub formed: usize,
    /// Partitions with fewer scored assets than the minimum.
    pub skipped_insufficient: usize,
    /// Partitions whose legs would be empty or overlap.
    pub skipped_degenerate: usize,
}

/// Position rows and return matrix produced by formation.
#[derive(Debug, Clone, PartialEq)]
pub struct FormationOutput {
    /// One row per selected asset, ordered by partition then leg then rank.
    pub positions: Vec<PositionRow>,
    /// Date × ticker returns of every ticker selected at least once.
    pub returns: ReturnMatrix,
    /// Partition outcome counts.
    pub summary: FormationSummary,
}

impl FormationOutput {
    /// Whether no portfolio was formed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Forms equal-weighted quantile portfolios per `(group, date)` partition.
///
/// Observations are partitioned by their `group` label and date; a panel
/// without group labels is partitioned by date alone.
#[derive(Debug, Clone, Default)]
pub struct PortfolioFormer {
    config: FormationConfig,
}

impl PortfolioFormer {
    /// Create a former with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a former with custom configuration.
    #[must_use]
    pub const fn with_config(config: FormationConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &FormationConfig {
        &self.config
    }

    /// Form portfolios over the whole panel.
    ///
    /// # Errors
    /// Returns `BacktestError::InvalidQuantile` for a quantile outside (0, 1], and
    /// `BacktestError::InsufficientData` for a thin partition under the `Fail` policy.
    pub fn form(&self, panel: &[FactorObservation]) -> Result<FormationOutput, BacktestError> {
        self.config.validate()?;

        let mut partitions: BTreeMap<PartitionKey, Vec<&FactorObservation>> = BTreeMap::new();
        for obs in panel {
            partitions.entry((obs.group.clone(), obs.date)).or_default().push(obs);
        }

        let mut summary = FormationSummary { partitions: partitions.len(), ..Default::default() };
        let mut positions = Vec::new();

        for ((group, date), rows) in &partitions {
            let mut scored: Vec<(&FactorObservation, f64)> =
                rows.iter().filter_map(|obs| obs.valid_score().map(|s| (*obs, s))).collect();
            let n = scored.len();

            if n < self.config.min_partition_size {
                match self.config.on_insufficient_data {
                    InsufficientDataPolicy::Skip => {
                        debug!(%date, ?group, scored = n, "partition skipped: insufficient scored assets");
                        summary.skipped_insufficient += 1;
                        continue;
                    }
                    InsufficientDataPolicy::Fail => {
                        return Err(BacktestError::InsufficientData {
                            date: *date,
                            group: group.clone(),
                            required: self.config.min_partition_size,
                            actual: n,
                        });
                    }
                }
            }

            let Some(leg_size) = self.leg_size(n) else {
                debug!(%date, ?group, scored = n, "partition skipped: legs would be empty or overlap");
                summary.skipped_degenerate += 1;
                continue;
            };

            self.rank(&mut scored);
            let weight = 1.0 / leg_size as f64;

            positions.extend(
                scored[..leg_size]
                    .iter()
                    .map(|(obs, score)| position_row(obs, *score, Leg::Long, weight)),
            );
            if self.config.mode.is_long_short() {
                positions.extend(
                    scored[n - leg_size..]
                        .iter()
                        .rev()
                        .map(|(obs, score)| position_row(obs, *score, Leg::Short, weight)),
                );
            }
            summary.formed += 1;
        }

        if summary.formed == 0 {
            warn!(
                partitions = summary.partitions,
                mode = %self.config.mode,
                "no valid portfolios formed"
            );
        } else {
            info!(
                formed = summary.formed,
                skipped_insufficient = summary.skipped_insufficient,
                skipped_degenerate = summary.skipped_degenerate,
                mode = %self.config.mode,
                "portfolios formed"
            );
        }

        let returns = selected_return_matrix(panel, &positions)?;
        Ok(FormationOutput { positions, returns, summary })
    }

    /// Per-leg size for a partition of `n` scored assets, `None` when degenerate.
    fn leg_size(&self, n: usize) -> Option<usize> {
        let cutoff = (n as f64 * self.config.quantile).floor() as usize;
        match self.config.mode {
            PortfolioMode::LongOnly => (cutoff > 0).then_some(cutoff),
            PortfolioMode::LongShort => {
                let cutoff = cutoff.max(1);
                (2 * cutoff <= n).then_some(cutoff)
            }
        }
    }

    /// Sort by descending score; the long leg is the head, the short leg the tail.
    fn rank(&self, scored: &mut [(&FactorObservation, f64)]) {
        match self.config.tie_break {
            TieBreak::InputOrder => scored.sort_by(|a, b| b.1.total_cmp(&a.1)),
            TieBreak::TickerAscending => scored
                .sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.ticker.cmp(&b.0.ticker))),
        }
    }
}

/// Form portfolios with the given configuration.
///
/// # Errors
/// See [`PortfolioFormer::form`].
pub fn form_portfolios(
    panel: &[FactorObservation],
    config: &FormationConfig,
) -> Result<FormationOutput, BacktestError> {
    PortfolioFormer::with_config(*config).form(panel)
}

fn position_row(obs: &FactorObservation, score: f64, leg: Leg, weight: f64) -> PositionRow {
    let position = leg.sign() * weight;
    let realized_return = obs.observed_return();
    PositionRow {
        date: obs.date,
        group: obs.group.clone(),
        ticker: obs.ticker.clone(),
        leg,
        factor_score: score,
        realized_return,
        position,
        weighted_return: realized_return.unwrap_or(0.0) * position,
    }
}

/// Pivot the unfiltered panel to dates × selected tickers.
///
/// The first non-missing return of a `(date, ticker)` pair wins; cells never
/// observed stay NaN.
fn selected_return_matrix(
    panel: &[FactorObservation],
    positions: &[PositionRow],
) -> Result<ReturnMatrix, BacktestError> {
    let tickers: BTreeSet<&Symbol> = positions.iter().map(|p| &p.ticker).collect();
    if tickers.is_empty() {
        return Ok(ReturnMatrix::empty());
    }
    let dates: BTreeSet<Date> = panel.iter().map(|obs| obs.date).collect();

    let col_index: HashMap<&Symbol, usize> = tickers.iter().enumerate().map(|(j, t)| (*t, j)).collect();
    let row_index: HashMap<Date, usize> = dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();

    let mut values = Array2::from_elem((dates.len(), tickers.len()), f64::NAN);
    for obs in panel {
        let (Some(&j), Some(ret)) = (col_index.get(&obs.ticker), obs.observed_return()) else {
            continue;
        };
        let i = row_index[&obs.date];
        if values[[i, j]].is_nan() {
            values[[i, j]] = ret;
        }
    }

    Ok(ReturnMatrix::new(
        dates.into_iter().collect(),
        tickers.into_iter().cloned().collect(),
        values,
    )?)
}
