//! End-to-end runs through CSV inputs and outputs.
#![allow(missing_docs)]

use approx::assert_relative_eq;
use factorfolio_optimizer::{PortfolioOptimizer, SolverChain};
use factorfolio_pipeline::{
    PipelineConfig, PipelineError, load_panel, load_returns, run_allocation,
    run_allocation_with, run_backtests, run_frontier,
};
use factorfolio_primitives::{AllocationSource, Date, PortfolioMode, ReturnMatrix, Symbol};
use factorfolio_utils::{CsvResultSink, read_csv, return_matrix_to_frame, write_csv};
use ndarray::Array2;
use polars::prelude::*;
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

fn synthetic_returns(rows: usize, drifts: &[f64], seed: u64) -> ReturnMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.01).unwrap();
    let values = Array2::from_shape_fn((rows, drifts.len()), |(_, j)| {
        drifts[j] + noise.sample(&mut rng)
    });
    let start = Date::from_ymd_opt(2022, 1, 3).unwrap();
    let dates = (0..rows).map(|d| start + chrono::Days::new(d as u64)).collect();
    let tickers = (0..drifts.len()).map(|j| Symbol::new(format!("A{j}"))).collect();
    ReturnMatrix::new(dates, tickers, values).unwrap()
}

fn write_panel(path: &std::path::Path) {
    let mut dates = Vec::new();
    let mut tickers = Vec::new();
    let mut scores = Vec::new();
    let mut returns = Vec::new();
    let mut classes = Vec::new();
    for d in 1..=5u32 {
        for i in 0..10 {
            let crypto = i % 2 == 1;
            dates.push(format!("2024-04-{d:02}"));
            tickers.push(if crypto { format!("C{i}-USD") } else { format!("EQ{i}") });
            scores.push(i as f64 + d as f64 * 0.1);
            returns.push(0.001 * i as f64);
            classes.push(if crypto { "Crypto" } else { "Equity" });
        }
    }
    let mut frame = df! {
        "Date" => dates,
        "Ticker" => tickers,
        "Momentum" => scores,
        "Return" => returns,
        "Asset_Class" => classes,
    }
    .unwrap();
    write_csv(path, &mut frame).unwrap();
}

#[test]
fn backtest_from_toml_and_csv() {
    let dir = tempfile::tempdir().unwrap();
    let panel_path = dir.path().join("panel.csv");
    write_panel(&panel_path);

    let config_path = dir.path().join("factorfolio.toml");
    let toml = format!(
        "[data]\npanel = {:?}\nscore_column = \"momentum\"\ngroup_column = \"asset_class\"\n\n[formation]\nquantile = 0.2\n",
        panel_path.display().to_string()
    );
    std::fs::write(&config_path, toml).unwrap();

    let config = PipelineConfig::from_path(&config_path).unwrap();
    let panel = load_panel(&config).unwrap();
    assert_eq!(panel.len(), 50);

    let results = run_backtests(&panel, &config).unwrap();
    // 5 names per (group, date): long/short legs of one name each
    let equity = results.run(Some("Equity"), PortfolioMode::LongShort).unwrap();
    assert_eq!(equity.factor, "momentum");
    assert_eq!(equity.report.series.len(), 5);
    assert_relative_eq!(equity.report.series.returns()[0], 0.008, epsilon = 1e-12);

    let out = dir.path().join("out");
    let mut sink = CsvResultSink::new(&out);
    results.write_to(&mut sink).unwrap();
    let summary = read_csv(out.join("backtest_summary.csv")).unwrap();
    assert_eq!(summary.height(), 4);
    assert!(out.join("positions_long_only.csv").exists());
    assert!(out.join("performance_crypto_long_short.csv").exists());
}

#[test]
fn allocation_from_returns_csv() {
    let dir = tempfile::tempdir().unwrap();
    let returns_path = dir.path().join("returns.csv");
    let matrix = synthetic_returns(300, &[0.0010, 0.0006, 0.0004, 0.0008], 11);
    write_csv(&returns_path, &mut return_matrix_to_frame(&matrix).unwrap()).unwrap();

    let mut config = PipelineConfig::default();
    config.data.returns = Some(returns_path);
    let loaded = load_returns(&config).unwrap();
    assert_eq!(loaded.n_cols(), 4);

    let outcome = run_allocation(&loaded, &config).unwrap();
    let weights = outcome.result.weights.values();
    assert_relative_eq!(weights.sum(), 1.0, epsilon = 1e-6);
    assert!(weights.iter().all(|&w| (-1e-6..=0.5 + 1e-6).contains(&w)));
    assert!(matches!(outcome.result.source, AllocationSource::Solver(_)));

    let shares: f64 = outcome.risk.iter().map(|r| r.contribution).sum();
    assert_relative_eq!(shares, 1.0, epsilon = 1e-9);
    assert_eq!(outcome.risk[0].ticker, Symbol::new("A0"));

    let out = dir.path().join("out");
    outcome.write_to(&mut CsvResultSink::new(&out)).unwrap();
    assert_eq!(read_csv(out.join("weights.csv")).unwrap().height(), 4);
}

#[test]
fn empty_solver_chain_ends_in_equal_weights() {
    let matrix = synthetic_returns(300, &[0.0010, 0.0006, 0.0004], 3);
    let config = PipelineConfig::default();
    let optimizer =
        PortfolioOptimizer::with_config(config.optimizer.config).with_chain(SolverChain::empty());

    let outcome = run_allocation_with(&optimizer, &matrix, &config).unwrap();
    assert_eq!(outcome.result.source, AllocationSource::EqualWeightFallback);
    for w in outcome.result.weights.values() {
        assert_relative_eq!(*w, 1.0 / 3.0, epsilon = 1e-12);
    }
}

#[test]
fn frontier_is_ordered_by_return() {
    let matrix = synthetic_returns(300, &[0.0010, 0.0006, 0.0004, 0.0008], 5);
    let mut config = PipelineConfig::default();
    config.optimizer.frontier_points = 6;

    let frontier = run_frontier(&matrix, &config).unwrap();
    assert!(!frontier.is_empty() && frontier.len() <= 6);
    assert!(frontier.windows(2).all(|w| w[0].expected_return <= w[1].expected_return + 1e-6));
}

#[test]
fn too_few_rows_is_an_optimizer_error() {
    let matrix = synthetic_returns(100, &[0.0010, 0.0006], 1);
    let err = run_allocation(&matrix, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::Optimize(_)));
}

#[test]
fn missing_inputs_are_reported() {
    let config = PipelineConfig::default();
    assert!(matches!(load_panel(&config), Err(PipelineError::MissingInput(_))));
    assert!(matches!(load_returns(&config), Err(PipelineError::MissingInput(_))));
}
