//! Conversions from factorfolio results to polars frames and back.

use factorfolio_primitives::{
    PerformanceSeries, PerformanceStats, PositionRow, ReturnMatrix, Symbol, Weights,
};
use ndarray::Array2;
use polars::prelude::*;

use crate::{
    UtilsError,
    columns::{DATE, TICKER, date_column, float_values, parse_dates},
};

/// Position rows as a long frame.
///
/// # Errors
/// Returns `UtilsError::Polars` if the frame cannot be built.
pub fn positions_to_frame(rows: &[PositionRow]) -> Result<DataFrame, UtilsError> {
    let dates: Vec<_> = rows.iter().map(|r| r.date).collect();
    let frame = DataFrame::new(vec![
        date_column(DATE, &dates)?,
        Column::new("group".into(), rows.iter().map(|r| r.group.clone()).collect::<Vec<_>>()),
        Column::new(TICKER.into(), rows.iter().map(|r| r.ticker.as_str()).collect::<Vec<_>>()),
        Column::new("leg".into(), rows.iter().map(|r| r.leg.label()).collect::<Vec<_>>()),
        Column::new(
            "factor_score".into(),
            rows.iter().map(|r| r.factor_score).collect::<Vec<_>>(),
        ),
        Column::new("return".into(), rows.iter().map(|r| r.realized_return).collect::<Vec<_>>()),
        Column::new("position".into(), rows.iter().map(|r| r.position).collect::<Vec<_>>()),
        Column::new(
            "weighted_return".into(),
            rows.iter().map(|r| r.weighted_return).collect::<Vec<_>>(),
        ),
    ])?;
    Ok(frame)
}

/// Daily portfolio returns with the cumulative growth series.
///
/// # Errors
/// Returns `UtilsError::Polars` if the frame cannot be built.
pub fn performance_to_frame(series: &PerformanceSeries) -> Result<DataFrame, UtilsError> {
    Ok(DataFrame::new(vec![
        date_column(DATE, &series.dates())?,
        Column::new("portfolio_return".into(), series.returns()),
        Column::new("cumulative_return".into(), series.cumulative()),
    ])?)
}

/// One-row frame of summary statistics.
///
/// # Errors
/// Returns `UtilsError::Polars` if the frame cannot be built.
pub fn stats_to_frame(stats: &PerformanceStats) -> Result<DataFrame, UtilsError> {
    Ok(df! {
        "cumulative_return" => [stats.cumulative_return],
        "sharpe_ratio" => [stats.sharpe_ratio],
        "volatility" => [stats.volatility],
        "max_drawdown" => [stats.max_drawdown],
    }?)
}

/// Ticker and weight columns.
///
/// # Errors
/// Returns `UtilsError::Polars` if the frame cannot be built.
pub fn weights_to_frame(weights: &Weights) -> Result<DataFrame, UtilsError> {
    let tickers: Vec<&str> = weights.tickers().iter().map(Symbol::as_str).collect();
    Ok(DataFrame::new(vec![
        Column::new(TICKER.into(), tickers),
        Column::new("weight".into(), weights.values().to_vec()),
    ])?)
}

/// Wide frame: a date column followed by one column per ticker.
///
/// NaN cells become nulls.
///
/// # Errors
/// Returns `UtilsError::Polars` if the frame cannot be built.
pub fn return_matrix_to_frame(matrix: &ReturnMatrix) -> Result<DataFrame, UtilsError> {
    let mut columns = Vec::with_capacity(matrix.n_cols() + 1);
    columns.push(date_column(DATE, matrix.dates())?);
    for (ticker, values) in matrix.tickers().iter().zip(matrix.values().columns()) {
        let cells: Vec<Option<f64>> =
            values.iter().map(|&v| if v.is_nan() { None } else { Some(v) }).collect();
        columns.push(Column::new(ticker.as_str().into(), cells));
    }
    Ok(DataFrame::new(columns)?)
}

/// Inverse of [`return_matrix_to_frame`].
///
/// The date column is matched case-insensitively; every other numeric
/// column becomes a ticker and non-numeric columns are ignored. Nulls become
/// NaN.
///
/// # Errors
/// Returns `UtilsError::MissingColumn` without a date column and
/// `UtilsError::InvalidDate` for unparsable dates.
pub fn return_matrix_from_frame(frame: &DataFrame) -> Result<ReturnMatrix, UtilsError> {
    let date_name = frame
        .get_column_names()
        .into_iter()
        .find(|name| name.eq_ignore_ascii_case(DATE))
        .cloned()
        .ok_or_else(|| UtilsError::MissingColumn(DATE.to_string()))?;
    let dates = parse_dates(frame.column(&date_name)?)?;

    let numeric: Vec<&Column> = frame
        .get_columns()
        .iter()
        .filter(|c| c.name() != &date_name && (c.dtype().is_float() || c.dtype().is_integer()))
        .collect();

    let mut values = Array2::from_elem((dates.len(), numeric.len()), f64::NAN);
    let mut tickers = Vec::with_capacity(numeric.len());
    for (j, column) in numeric.into_iter().enumerate() {
        tickers.push(Symbol::new(column.name().as_str()));
        for (i, v) in float_values(column)?.into_iter().enumerate() {
            if let Some(v) = v {
                values[[i, j]] = v;
            }
        }
    }

    Ok(ReturnMatrix::new(dates, tickers, values)?)
}

#[cfg(test)]
mod tests {
    use factorfolio_primitives::{Date, Leg, PerformancePoint};
    use ndarray::array;

    use super::*;

    fn date(d: u32) -> Date {
        Date::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn return_matrix_survives_frame_conversion() {
        let matrix = ReturnMatrix::new(
            vec![date(2), date(3)],
            vec![Symbol::new("AAA"), Symbol::new("BTC-USD")],
            array![[0.01, f64::NAN], [-0.02, 0.05]],
        )
        .unwrap();
        let frame = return_matrix_to_frame(&matrix).unwrap();
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.column("BTC-USD").unwrap().null_count(), 1);

        let back = return_matrix_from_frame(&frame).unwrap();
        assert_eq!(back.dates(), matrix.dates());
        assert_eq!(back.tickers(), matrix.tickers());
        assert!(back.values()[[0, 1]].is_nan());
        assert_eq!(back.values()[[1, 0]], -0.02);
    }

    #[test]
    fn non_numeric_columns_are_ignored() {
        let frame = df! {
            "Date" => &["2024-01-02", "2024-01-03"],
            "name" => &["x", "y"],
            "AAA" => &[1i64, 2],
        }
        .unwrap();
        let matrix = return_matrix_from_frame(&frame).unwrap();
        assert_eq!(matrix.tickers(), &[Symbol::new("AAA")]);
        assert_eq!(matrix.values(), &array![[1.0], [2.0]]);
    }

    #[test]
    fn positions_frame_has_one_row_per_position() {
        let rows = vec![
            PositionRow {
                date: date(2),
                group: None,
                ticker: Symbol::new("AAA"),
                leg: Leg::Long,
                factor_score: 1.0,
                realized_return: Some(0.01),
                position: 0.5,
                weighted_return: 0.005,
            },
            PositionRow {
                date: date(2),
                group: None,
                ticker: Symbol::new("BBB"),
                leg: Leg::Short,
                factor_score: -1.0,
                realized_return: None,
                position: -0.5,
                weighted_return: 0.0,
            },
        ];
        let frame = positions_to_frame(&rows).unwrap();
        assert_eq!(frame.shape(), (2, 8));
        let legs = frame.column("leg").unwrap().as_materialized_series().str().unwrap().clone();
        assert_eq!(legs.get(1), Some("short"));
        assert_eq!(frame.column("return").unwrap().null_count(), 1);
    }

    #[test]
    fn performance_and_stats_frames() {
        let series = PerformanceSeries::new(vec![
            PerformancePoint { date: date(2), portfolio_return: 0.1, cumulative: 1.1 },
            PerformancePoint { date: date(3), portfolio_return: -0.1, cumulative: 0.99 },
        ]);
        let frame = performance_to_frame(&series).unwrap();
        assert_eq!(frame.shape(), (2, 3));

        let stats = stats_to_frame(&PerformanceStats::zero()).unwrap();
        assert_eq!(stats.shape(), (1, 4));
    }
}
