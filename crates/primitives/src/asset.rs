//! Asset identifier and classification types.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Ticker symbol identifying an asset across the panel.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Symbol(pub String);

impl Symbol {
    /// Create a new symbol.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Broad asset class used to split a combined universe into groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    /// Listed equities.
    Equity,
    /// Crypto assets quoted against USD.
    Crypto,
}

impl AssetClass {
    /// Classify a ticker by naming convention.
    ///
    /// Tickers quoted against USD (`BTC-USD`) are crypto, everything else is equity.
    #[must_use]
    pub fn from_ticker(ticker: &str) -> Self {
        if ticker.contains("-USD") { Self::Crypto } else { Self::Equity }
    }

    /// Group label used in panel group columns.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Equity => "Equity",
            Self::Crypto => "Crypto",
        }
    }
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_from_str() {
        let sym: Symbol = "AAPL".into();
        assert_eq!(sym.as_str(), "AAPL");
        assert_eq!(sym.to_string(), "AAPL");
    }

    #[test]
    fn symbols_order_lexically() {
        let mut syms = vec![Symbol::new("MSFT"), Symbol::new("AAPL"), Symbol::new("BTC-USD")];
        syms.sort();
        assert_eq!(syms[0].as_str(), "AAPL");
        assert_eq!(syms[2].as_str(), "MSFT");
    }

    #[test]
    fn asset_class_by_ticker() {
        assert_eq!(AssetClass::from_ticker("BTC-USD"), AssetClass::Crypto);
        assert_eq!(AssetClass::from_ticker("ETH-USD"), AssetClass::Crypto);
        assert_eq!(AssetClass::from_ticker("AAPL"), AssetClass::Equity);
        assert_eq!(AssetClass::Crypto.to_string(), "Crypto");
    }
}
