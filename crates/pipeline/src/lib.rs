#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factorfolio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod config;
pub use config::{DataConfig, FormationSettings, OptimizerSettings, PipelineConfig};

mod data;
pub use data::{load_panel, load_panel_from, load_returns};

mod backtest;
pub use backtest::{BacktestResults, BacktestRun, ModeBacktest, group_start, run_backtests};

mod allocate;
pub use allocate::{
    AllocationOutcome, MIN_ALLOCATION_ASSETS, frontier_frame, run_allocation,
    run_allocation_with, run_frontier,
};

mod error;
pub use error::PipelineError;
