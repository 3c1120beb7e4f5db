//! Column names and date conversion shared by the frame helpers.

use factorfolio_primitives::Date;
use polars::prelude::*;

use crate::UtilsError;

/// Date column.
pub const DATE: &str = "date";
/// Ticker column.
pub const TICKER: &str = "ticker";
/// Realized return column.
pub const RETURN: &str = "return";
/// Default factor-score column.
pub const FACTOR_SCORE: &str = "factor_score";

/// Days between 0001-01-01 and 1970-01-01.
const UNIX_EPOCH_FROM_CE: i32 = 719_163;

/// Days since the Unix epoch, as stored by polars `Date`.
#[must_use]
pub fn date_to_days(date: Date) -> i32 {
    use chrono::Datelike;
    date.num_days_from_ce() - UNIX_EPOCH_FROM_CE
}

/// Inverse of [`date_to_days`].
#[must_use]
pub fn days_to_date(days: i32) -> Option<Date> {
    Date::from_num_days_from_ce_opt(days + UNIX_EPOCH_FROM_CE)
}

/// Polars `Date` column from chrono dates.
///
/// # Errors
/// Returns `UtilsError::Polars` if the cast fails.
pub fn date_column(name: &str, dates: &[Date]) -> Result<Column, UtilsError> {
    let days: Vec<i32> = dates.iter().map(|&d| date_to_days(d)).collect();
    Ok(Series::new(name.into(), days).cast(&DataType::Date)?.into_column())
}

/// Read a `Date`, `Datetime` or `%Y-%m-%d` string column.
///
/// # Errors
/// Returns `UtilsError::InvalidDate` for nulls, unparsable strings and other
/// dtypes.
pub fn parse_dates(column: &Column) -> Result<Vec<Date>, UtilsError> {
    let series = column.as_materialized_series();
    match series.dtype() {
        DataType::String => series
            .str()?
            .into_iter()
            .map(|s: Option<&str>| {
                let s = s.ok_or_else(|| UtilsError::InvalidDate("null".to_string()))?;
                Date::parse_from_str(s.trim(), "%Y-%m-%d")
                    .map_err(|_| UtilsError::InvalidDate(s.to_string()))
            })
            .collect(),
        DataType::Date | DataType::Datetime(_, _) => series
            .cast(&DataType::Date)?
            .date()?
            .into_iter()
            .map(|d: Option<i32>| {
                d.and_then(days_to_date)
                    .ok_or_else(|| UtilsError::InvalidDate(format!("{d:?}")))
            })
            .collect(),
        other => Err(UtilsError::InvalidDate(format!("unsupported dtype {other}"))),
    }
}

/// Optional floats of a numeric column, NaN mapped to `None`.
///
/// # Errors
/// Returns `UtilsError::Polars` if the column cannot be cast to `Float64`.
pub fn float_values(column: &Column) -> Result<Vec<Option<f64>>, UtilsError> {
    let series = column.as_materialized_series().cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().map(|v| v.filter(|x| !x.is_nan())).collect())
}

/// Strings of a column cast to `String`.
///
/// # Errors
/// Returns `UtilsError::Polars` if the column cannot be cast.
pub fn string_values(column: &Column) -> Result<Vec<Option<String>>, UtilsError> {
    let series = column.as_materialized_series().cast(&DataType::String)?;
    Ok(series.str()?.into_iter().map(|s| s.map(str::to_string)).collect())
}
