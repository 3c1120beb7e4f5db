#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factorfolio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod columns;
pub use columns::{
    DATE, FACTOR_SCORE, RETURN, TICKER, date_column, date_to_days, days_to_date, float_values,
    parse_dates, string_values,
};

mod panel;
pub use panel::{PanelColumns, panel_from_frame};

mod frames;
pub use frames::{
    performance_to_frame, positions_to_frame, return_matrix_from_frame, return_matrix_to_frame,
    stats_to_frame, weights_to_frame,
};

mod csv;
pub use csv::{CsvPanelSource, CsvResultSink, read_csv, write_csv};

mod prepare;
pub use prepare::{PreparationConfig, PreparationReport, prepare_returns};

mod diagnostics;
pub use diagnostics::{MIN_TICKERS_PER_DATE, PanelDiagnostics, inspect_panel};

mod error;
pub use error::UtilsError;
