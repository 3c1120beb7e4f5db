#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factorfolio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod config;
pub use config::OptimizerConfig;

mod clean;
pub use clean::CleaningPolicy;

mod estimate;
pub use estimate::{ReturnEstimator, expected_returns, regularized_covariance};

mod solvers;
pub use solvers::{ActiveSetSolver, InteriorPointSolver, ProjectedGradientSolver};

mod chain;
pub use chain::{ChainSolution, SolverChain, portfolio_performance};

mod fallback;
pub use fallback::equal_weight_performance;

mod optimize;
pub use optimize::{PortfolioOptimizer, optimize_portfolio};

mod frontier;
pub use frontier::FrontierPoint;

mod error;
pub use error::OptimizeError;

#[cfg(test)]
mod test_support;

/// Re-export commonly used types.
pub mod prelude {
    pub use factorfolio_primitives::{OptimizationMethod, OptimizationResult};
    pub use factorfolio_traits::{MeanVarianceProblem, Objective, PortfolioSolver, WeightBounds};

    pub use super::{OptimizeError, OptimizerConfig, PortfolioOptimizer, SolverChain};
}
