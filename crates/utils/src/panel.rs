//! Factor panel ingestion from polars frames.

use factorfolio_primitives::{FactorObservation, Symbol};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    UtilsError,
    columns::{DATE, FACTOR_SCORE, RETURN, TICKER, float_values, parse_dates, string_values},
};

/// Which columns of a panel frame hold the score and the group key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelColumns {
    /// Factor-score column.
    pub score: String,
    /// Optional grouping column.
    pub group: Option<String>,
}

impl Default for PanelColumns {
    fn default() -> Self {
        Self { score: FACTOR_SCORE.to_string(), group: None }
    }
}

impl PanelColumns {
    /// Use `score` as the factor-score column.
    #[must_use]
    pub fn with_score(mut self, score: impl Into<String>) -> Self {
        self.score = score.into();
        self
    }

    /// Group partitions by `group`.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

fn required<'a>(frame: &'a DataFrame, name: &str) -> Result<&'a Column, UtilsError> {
    frame.column(&name.to_lowercase()).map_err(|_| UtilsError::MissingColumn(name.to_string()))
}

/// Convert a panel frame into observations.
///
/// Column names are matched case-insensitively. `date`, `ticker` and the
/// score column are required; a missing `return` column yields all-missing
/// returns. Rows with a null ticker are dropped.
///
/// # Errors
/// Returns `UtilsError::MissingColumn` for an absent required column and
/// `UtilsError::InvalidDate` for unparsable dates.
pub fn panel_from_frame(
    frame: &DataFrame,
    columns: &PanelColumns,
) -> Result<Vec<FactorObservation>, UtilsError> {
    let mut frame = frame.clone();
    let lowered: Vec<String> =
        frame.get_column_names().iter().map(|name| name.to_lowercase()).collect();
    frame.set_column_names(lowered)?;

    let dates = parse_dates(required(&frame, DATE)?)?;
    let tickers = string_values(required(&frame, TICKER)?)?;
    let scores = float_values(required(&frame, &columns.score)?)?;
    let returns = match frame.column(RETURN) {
        Ok(column) => float_values(column)?,
        Err(_) => vec![None; frame.height()],
    };
    let groups = match &columns.group {
        Some(group) => string_values(required(&frame, group)?)?,
        None => vec![None; frame.height()],
    };

    let mut panel = Vec::with_capacity(frame.height());
    let mut dropped = 0usize;
    for ((((date, ticker), score), ret), group) in
        dates.into_iter().zip(tickers).zip(scores).zip(returns).zip(groups)
    {
        let Some(ticker) = ticker else {
            dropped += 1;
            continue;
        };
        panel.push(FactorObservation {
            date,
            group,
            ticker: Symbol::new(ticker),
            factor_score: score,
            realized_return: ret,
        });
    }

    debug!(rows = panel.len(), dropped, "panel loaded");
    Ok(panel)
}

#[cfg(test)]
mod tests {
    use factorfolio_primitives::Date;

    use super::*;

    fn frame() -> DataFrame {
        df! {
            "Date" => &["2024-01-02", "2024-01-02", "2024-01-03"],
            "TICKER" => &[Some("AAA"), Some("BBB"), None],
            "Momentum" => &[Some(1.5), None, Some(0.3)],
            "Return" => &[0.01, -0.02, 0.0],
            "Asset_Class" => &["Equity", "Crypto", "Equity"],
        }
        .unwrap()
    }

    #[test]
    fn reads_columns_case_insensitively() {
        let columns = PanelColumns::default().with_score("Momentum").with_group("asset_class");
        let panel = panel_from_frame(&frame(), &columns).unwrap();

        assert_eq!(panel.len(), 2);
        assert_eq!(panel[0].date, Date::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(panel[0].ticker, Symbol::new("AAA"));
        assert_eq!(panel[0].factor_score, Some(1.5));
        assert_eq!(panel[1].factor_score, None);
        assert_eq!(panel[1].realized_return, Some(-0.02));
        assert_eq!(panel[1].group.as_deref(), Some("Crypto"));
    }

    #[test]
    fn missing_return_column_means_missing_returns() {
        let frame = frame().drop("Return").unwrap();
        let panel =
            panel_from_frame(&frame, &PanelColumns::default().with_score("momentum")).unwrap();
        assert!(panel.iter().all(|o| o.realized_return.is_none()));
        assert!(panel.iter().all(|o| o.group.is_none()));
    }

    #[test]
    fn missing_score_column_is_an_error() {
        let err = panel_from_frame(&frame(), &PanelColumns::default()).unwrap_err();
        assert!(matches!(err, UtilsError::MissingColumn(c) if c == "factor_score"));
    }
}
