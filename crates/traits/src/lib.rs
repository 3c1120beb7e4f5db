#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factorfolio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod solver;
pub use solver::{MeanVarianceProblem, Objective, PortfolioSolver, SolverError, WeightBounds};

mod source;
pub use source::{PanelSource, ResultSink, SourceError};
