#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factorfolio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod config;
pub use config::{FormationConfig, InsufficientDataPolicy, TieBreak};

mod formation;
pub use formation::{FormationOutput, FormationSummary, PortfolioFormer, form_portfolios};

mod performance;
pub use performance::{
    DEFAULT_ROLLING_WINDOW, compute_performance, compute_performance_by_group, rolling_sharpe,
    summarize_returns,
};

mod error;
pub use error::BacktestError;

/// Re-export commonly used types.
pub mod prelude {
    pub use factorfolio_primitives::{FactorObservation, PortfolioMode, PositionRow};

    pub use super::{
        BacktestError, FormationConfig, PortfolioFormer, compute_performance, form_portfolios,
    };
}
