//! Example: Robust Allocation with Solver Escalation
//!
//! Simulates two years of daily returns for a small multi-asset universe and:
//! - optimizes max-Sharpe and min-volatility weights
//! - shows which solver in the escalation chain produced them
//! - re-runs with a custom chain order
//! - traces the efficient frontier
//! - decomposes portfolio risk by ticker

use factorfolio::{
    optimizer::{
        ActiveSetSolver, OptimizerConfig, PortfolioOptimizer, ProjectedGradientSolver, SolverChain,
    },
    primitives::{Date, OptimizationMethod, ReturnMatrix, Symbol},
    risk::{correlation_matrix, risk_contribution_by_ticker},
};
use ndarray::Array2;
use rand_distr::{Distribution, Normal};

/// (ticker, daily drift, daily volatility, market beta)
const UNIVERSE: &[(&str, f64, f64, f64)] = &[
    ("SPY", 0.0004, 0.004, 1.0),
    ("QQQ", 0.0006, 0.006, 1.2),
    ("TLT", 0.0001, 0.005, -0.3),
    ("GLD", 0.0002, 0.006, 0.1),
    ("BTC-USD", 0.0010, 0.030, 0.8),
    ("ETH-USD", 0.0009, 0.035, 0.9),
];

fn simulate(days: usize) -> ReturnMatrix {
    let mut rng = rand::thread_rng();
    let market = Normal::new(0.0, 0.008).unwrap();
    let unit = Normal::new(0.0, 1.0).unwrap();

    let mut values = Array2::zeros((days, UNIVERSE.len()));
    for mut row in values.rows_mut() {
        let m: f64 = market.sample(&mut rng);
        for (j, &(_, drift, vol, beta)) in UNIVERSE.iter().enumerate() {
            row[j] = drift + beta * m + vol * unit.sample(&mut rng);
        }
    }

    let start = Date::from_ymd_opt(2023, 1, 2).unwrap();
    let dates = (0..days as u64).map(|d| start + chrono::Days::new(d)).collect();
    let tickers = UNIVERSE.iter().map(|(t, ..)| Symbol::new(*t)).collect();
    ReturnMatrix::new(dates, tickers, values).expect("shape matches labels")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Robust Allocation ===\n");

    let returns = simulate(504);
    let optimizer = PortfolioOptimizer::with_config(OptimizerConfig::default());

    for method in [OptimizationMethod::MaxSharpe, OptimizationMethod::MinVolatility] {
        let result = optimizer.optimize(&returns, method)?;
        println!("{method} (via {})", result.source);
        println!(
            "  return {:.2}%  vol {:.2}%  sharpe {:.3}",
            result.performance.annual_return * 100.0,
            result.performance.annual_volatility * 100.0,
            result.performance.sharpe_ratio
        );

        let risk = risk_contribution_by_ticker(&result.weights, &result.covariance)?;
        for row in &risk {
            println!(
                "  {:<8} weight {:>6.2}%  risk {:>6.2}%",
                row.ticker.as_str(),
                row.weight * 100.0,
                row.contribution * 100.0
            );
        }
        println!();
    }

    // First-order solvers only, active set as the backstop.
    let chain = SolverChain::empty().push(ProjectedGradientSolver::new()).push(ActiveSetSolver::new());
    println!("Custom chain: {:?}", chain.names());
    let custom = PortfolioOptimizer::new().with_chain(chain);
    let result = custom.optimize(&returns, OptimizationMethod::MaxSharpe)?;
    println!("  max_sharpe via {}, sharpe {:.3}\n", result.source, result.performance.sharpe_ratio);

    println!("Efficient frontier:");
    for point in optimizer.efficient_frontier(&returns, 8)? {
        println!(
            "  return {:>6.2}%  vol {:>6.2}%",
            point.expected_return * 100.0,
            point.volatility * 100.0
        );
    }

    let corr = correlation_matrix(&returns);
    println!("\nCorrelation SPY/QQQ: {:.2}, SPY/TLT: {:.2}", corr[[0, 1]], corr[[0, 2]]);

    Ok(())
}
