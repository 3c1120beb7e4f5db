//! # factorfolio
//!
//! Factor-sorted portfolio backtests and robust mean-variance allocation.
//!
//! This crate provides a unified interface to the factorfolio ecosystem.
//! Individual components can be enabled via feature flags.
//!
//! ## Features
//!
//! - `full` (default): Enables all components
//! - `primitives`: Data model
//! - `traits`: Solver and data-source seams
//! - `math`: Numerical kernels
//! - `backtest`: Portfolio formation and performance
//! - `optimizer`: Allocation with solver escalation
//! - `risk`: Risk decomposition
//! - `utils`: Polars interop and return preparation
//! - `pipeline`: TOML-driven runs
//! - `cli`: The `factorfolio` binary
//!
//! ## Example
//!
//! ```rust,ignore
//! use factorfolio::backtest::{FormationConfig, form_portfolios, compute_performance};
//!
//! let output = form_portfolios(&panel, &FormationConfig::default())?;
//! let report = compute_performance(&output.positions);
//!
//! // Or with specific features only:
//! // [dependencies]
//! // factorfolio = { version = "0.1", default-features = false, features = ["optimizer"] }
//! ```

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[cfg(feature = "primitives")]
#[doc(inline)]
pub use factorfolio_primitives as primitives;
#[cfg(feature = "traits")]
#[doc(inline)]
pub use factorfolio_traits as traits;
#[cfg(feature = "math")]
#[doc(inline)]
pub use factorfolio_math as math;
#[cfg(feature = "backtest")]
#[doc(inline)]
pub use factorfolio_backtest as backtest;
#[cfg(feature = "optimizer")]
#[doc(inline)]
pub use factorfolio_optimizer as optimizer;
#[cfg(feature = "risk")]
#[doc(inline)]
pub use factorfolio_risk as risk;
#[cfg(feature = "utils")]
#[doc(inline)]
pub use factorfolio_utils as utils;
#[cfg(feature = "pipeline")]
#[doc(inline)]
pub use factorfolio_pipeline as pipeline;
