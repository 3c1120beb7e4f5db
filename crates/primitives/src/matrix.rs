//! Date × ticker return matrix.

use ndarray::{Array2, ArrayView1, Axis};

use crate::{Date, PrimitivesError, Symbol};

/// Daily returns laid out with one row per date and one column per ticker.
///
/// Missing values are stored as NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    dates: Vec<Date>,
    tickers: Vec<Symbol>,
    values: Array2<f64>,
}

impl ReturnMatrix {
    /// Create a matrix, checking that labels match the value shape.
    ///
    /// # Errors
    /// Returns `PrimitivesError::ShapeMismatch` if label counts differ from the value shape.
    pub fn new(
        dates: Vec<Date>,
        tickers: Vec<Symbol>,
        values: Array2<f64>,
    ) -> Result<Self, PrimitivesError> {
        if values.nrows() != dates.len() || values.ncols() != tickers.len() {
            return Err(PrimitivesError::ShapeMismatch {
                rows: dates.len(),
                cols: tickers.len(),
                actual_rows: values.nrows(),
                actual_cols: values.ncols(),
            });
        }
        Ok(Self { dates, tickers, values })
    }

    /// An empty matrix with no dates and no tickers.
    #[must_use]
    pub fn empty() -> Self {
        Self { dates: Vec::new(), tickers: Vec::new(), values: Array2::zeros((0, 0)) }
    }

    /// Row labels.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Column labels.
    #[must_use]
    pub fn tickers(&self) -> &[Symbol] {
        &self.tickers
    }

    /// Raw values (n_dates x n_tickers).
    #[must_use]
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of dates.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    /// Number of tickers.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    /// Whether the matrix has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column index of a ticker.
    #[must_use]
    pub fn ticker_index(&self, ticker: &str) -> Option<usize> {
        self.tickers.iter().position(|t| t.as_str() == ticker)
    }

    /// Return series of one ticker.
    #[must_use]
    pub fn column(&self, ticker: &str) -> Option<ArrayView1<'_, f64>> {
        self.ticker_index(ticker).map(|j| self.values.column(j))
    }

    /// Whether any cell is NaN or infinite.
    #[must_use]
    pub fn has_non_finite(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }

    /// Keep only rows for which `keep` returns true.
    #[must_use]
    pub fn filter_rows<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(ArrayView1<'_, f64>) -> bool,
    {
        let kept: Vec<usize> =
            self.values.axis_iter(Axis(0)).enumerate().filter(|(_, row)| keep(*row)).map(|(i, _)| i).collect();
        Self {
            dates: kept.iter().map(|&i| self.dates[i]).collect(),
            tickers: self.tickers.clone(),
            values: self.values.select(Axis(0), &kept),
        }
    }

    /// Keep only the columns at the given indices, in the given order.
    #[must_use]
    pub fn select_columns(&self, indices: &[usize]) -> Self {
        Self {
            dates: self.dates.clone(),
            tickers: indices.iter().map(|&j| self.tickers[j].clone()).collect(),
            values: self.values.select(Axis(1), indices),
        }
    }

    /// Apply a function to every cell.
    #[must_use]
    pub fn map_values<F>(&self, f: F) -> Self
    where
        F: FnMut(&f64) -> f64,
    {
        Self { dates: self.dates.clone(), tickers: self.tickers.clone(), values: self.values.map(f) }
    }

    /// Split into labels and values.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Date>, Vec<Symbol>, Array2<f64>) {
        (self.dates, self.tickers, self.values)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn sample() -> ReturnMatrix {
        let dates = vec![
            Date::from_ymd_opt(2024, 1, 2).unwrap(),
            Date::from_ymd_opt(2024, 1, 3).unwrap(),
            Date::from_ymd_opt(2024, 1, 4).unwrap(),
        ];
        let tickers = vec![Symbol::new("A"), Symbol::new("B")];
        ReturnMatrix::new(dates, tickers, array![[0.01, 0.02], [f64::NAN, 0.0], [0.03, -0.01]])
            .unwrap()
    }

    #[test]
    fn shape_mismatch_rejected() {
        let err = ReturnMatrix::new(vec![], vec![Symbol::new("A")], Array2::zeros((1, 1)));
        assert!(err.is_err());
    }

    #[test]
    fn column_lookup() {
        let m = sample();
        assert_eq!(m.column("B").unwrap()[2], -0.01);
        assert!(m.column("C").is_none());
        assert!(m.has_non_finite());
    }

    #[test]
    fn filter_rows_drops_missing() {
        let m = sample().filter_rows(|row| row.iter().all(|v| v.is_finite()));
        assert_eq!(m.n_rows(), 2);
        assert_eq!(m.dates()[1], Date::from_ymd_opt(2024, 1, 4).unwrap());
        assert!(!m.has_non_finite());
    }

    #[test]
    fn select_columns_reorders() {
        let m = sample().select_columns(&[1]);
        assert_eq!(m.n_cols(), 1);
        assert_eq!(m.tickers()[0].as_str(), "B");
    }
}
