//! Ticker-keyed allocation weights.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::{PrimitivesError, Symbol};

/// Portfolio weights keyed by ticker, in a fixed column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    tickers: Vec<Symbol>,
    values: Array1<f64>,
}

impl Weights {
    /// Pair tickers with weight values.
    ///
    /// # Errors
    /// Returns `PrimitivesError::LengthMismatch` if the lengths differ.
    pub fn new(tickers: Vec<Symbol>, values: Array1<f64>) -> Result<Self, PrimitivesError> {
        if tickers.len() != values.len() {
            return Err(PrimitivesError::LengthMismatch {
                expected: tickers.len(),
                actual: values.len(),
            });
        }
        Ok(Self { tickers, values })
    }

    /// Equal weights `1/n` over the given tickers.
    #[must_use]
    pub fn equal(tickers: Vec<Symbol>) -> Self {
        let n = tickers.len();
        let values = if n == 0 { Array1::zeros(0) } else { Array1::from_elem(n, 1.0 / n as f64) };
        Self { tickers, values }
    }

    /// Tickers in weight order.
    #[must_use]
    pub fn tickers(&self) -> &[Symbol] {
        &self.tickers
    }

    /// Weight values.
    #[must_use]
    pub const fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Weight of one ticker.
    #[must_use]
    pub fn get(&self, ticker: &str) -> Option<f64> {
        self.tickers.iter().position(|t| t.as_str() == ticker).map(|i| self.values[i])
    }

    /// Iterate `(ticker, weight)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, f64)> + '_ {
        self.tickers.iter().zip(self.values.iter().copied())
    }

    /// Sum of all weights.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.values.sum()
    }

    /// Whether every weight is exactly zero.
    #[must_use]
    pub fn is_all_zero(&self) -> bool {
        self.values.iter().all(|&w| w == 0.0)
    }

    /// Number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
