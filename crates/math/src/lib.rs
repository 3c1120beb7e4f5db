#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factorfolio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod stats;
pub use stats::{
    MIN_STD_THRESHOLD, TRADING_DAYS, correlation_from_covariance, mean, sample_covariance,
    sample_std,
};

mod clip;
pub use clip::{Clipper, clip};

mod simplex;
pub use simplex::{equal_weights, project_capped_simplex};

mod linalg;
pub use linalg::{is_finite_matrix, quad_form, solve_linear_system, symmetrize};

mod error;
pub use error::MathError;
