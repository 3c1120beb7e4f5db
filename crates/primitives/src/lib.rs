#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factorfolio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod allocation;
pub use allocation::{
    AllocationSource, OptimizationMethod, OptimizationResult, PortfolioPerformance,
};

mod asset;
pub use asset::{AssetClass, Symbol};

mod error;
pub use error::PrimitivesError;

mod matrix;
pub use matrix::ReturnMatrix;

mod observation;
pub use observation::FactorObservation;

mod performance;
pub use performance::{PerformancePoint, PerformanceReport, PerformanceSeries, PerformanceStats};

mod positions;
pub use positions::{Leg, PortfolioMode, PositionRow};

mod weights;
pub use weights::Weights;

/// Re-export common date type.
pub type Date = chrono::NaiveDate;
