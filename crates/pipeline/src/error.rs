//! Error types for pipeline runs.

use factorfolio_backtest::BacktestError;
use factorfolio_optimizer::OptimizeError;
use factorfolio_primitives::PrimitivesError;
use factorfolio_risk::RiskError;
use factorfolio_traits::SourceError;
use factorfolio_utils::UtilsError;

/// Errors raised while configuring or running a pipeline stage.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Configuration file could not be read or written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is not valid TOML for this schema.
    #[error("invalid configuration file: {0}")]
    ParseConfig(#[from] toml::de::Error),

    /// Configuration could not be rendered.
    #[error("could not render configuration: {0}")]
    RenderConfig(#[from] toml::ser::Error),

    /// Configuration values out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A required input path is not configured.
    #[error("no {0} configured")]
    MissingInput(&'static str),

    /// Start alignment names a group absent from the panel.
    #[error("group {0:?} has no observations")]
    UnknownGroup(String),

    /// Too few assets survive preparation to optimise.
    #[error("need at least {required} assets after preparation, got {actual}")]
    TooFewAssets {
        /// Minimum number of assets.
        required: usize,
        /// Assets left.
        actual: usize,
    },

    /// Panel source or result sink error.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Polars error.
    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Frame conversion or preparation error.
    #[error("utils error: {0}")]
    Utils(#[from] UtilsError),

    /// Formation or performance error.
    #[error("backtest error: {0}")]
    Backtest(#[from] BacktestError),

    /// Optimisation error.
    #[error("optimize error: {0}")]
    Optimize(#[from] OptimizeError),

    /// Risk decomposition error.
    #[error("risk error: {0}")]
    Risk(#[from] RiskError),

    /// Primitive construction error.
    #[error("primitive error: {0}")]
    Primitives(#[from] PrimitivesError),
}

impl PipelineError {
    /// Returns whether this error is recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Source(e) => e.is_recoverable(),
            Self::Utils(e) => e.is_recoverable(),
            Self::Backtest(e) => e.is_recoverable(),
            Self::Optimize(e) => e.is_recoverable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = PipelineError::TooFewAssets { required: 2, actual: 1 };
        assert_eq!(err.to_string(), "need at least 2 assets after preparation, got 1");
        assert_eq!(PipelineError::MissingInput("panel path").to_string(), "no panel path configured");
    }

    #[test]
    fn wrapped_errors_keep_recoverability() {
        let err = PipelineError::from(OptimizeError::UnknownMethod("x".into()));
        assert!(!err.is_recoverable());
        assert!(PipelineError::from(SourceError::NotFound("p".into())).is_recoverable());
        assert!(!PipelineError::UnknownGroup("Crypto".into()).is_recoverable());
    }
}
