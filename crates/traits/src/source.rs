//! External data collaborator traits.

use polars::prelude::*;

/// Errors raised by panel sources and result sinks.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Underlying file could not be read or written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error.
    #[error("data processing error: {0}")]
    Polars(#[from] PolarsError),

    /// Named resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl SourceError {
    /// Returns whether this error is recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Supplier of the upstream factor panel.
///
/// The returned frame holds at least `date`, `ticker`, a factor-score column
/// and optionally `return`; column names may be in any case.
pub trait PanelSource {
    /// Load the panel.
    ///
    /// # Errors
    /// Returns `SourceError` if the panel cannot be read.
    fn load(&self) -> Result<DataFrame, SourceError>;
}

/// Destination for named result tables.
pub trait ResultSink {
    /// Persist a table under `name`.
    ///
    /// # Errors
    /// Returns `SourceError` if the table cannot be written.
    fn write(&mut self, name: &str, frame: &mut DataFrame) -> Result<(), SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MemorySink {
        tables: Vec<(String, usize)>,
    }

    impl ResultSink for MemorySink {
        fn write(&mut self, name: &str, frame: &mut DataFrame) -> Result<(), SourceError> {
            self.tables.push((name.to_string(), frame.height()));
            Ok(())
        }
    }

    #[test]
    fn sink_receives_tables() {
        let mut sink = MemorySink::default();
        let mut df = DataFrame::new(vec![Column::new("a".into(), vec![1.0, 2.0])]).unwrap();
        sink.write("weights", &mut df).unwrap();
        assert_eq!(sink.tables, vec![("weights".to_string(), 2)]);
    }

    #[test]
    fn source_error_is_recoverable() {
        assert!(SourceError::NotFound("panel.csv".into()).is_recoverable());
        let io = std::io::Error::other("disk");
        assert!(!SourceError::from(io).is_recoverable());
    }
}
