#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factorfolio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod contribution;
pub use contribution::{
    RiskContribution, marginal_contribution_to_risk, risk_contribution, risk_contribution_by_ticker,
};

mod covariance;
pub use covariance::{correlation_matrix, covariance_matrix};

mod error;
pub use error::RiskError;
