//! Command-line driver for factorfolio runs.
//!
//! Usage: `factorfolio [-v...] [--config FILE] <COMMAND>`
//! Example: `factorfolio -v --config factorfolio.toml backtest --output out`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use factorfolio::{
    backtest::PortfolioFormer,
    pipeline::{
        PipelineConfig, frontier_frame, load_panel, load_returns, run_allocation, run_backtests,
        run_frontier,
    },
    primitives::{OptimizationMethod, PortfolioMode, ReturnMatrix},
    traits::ResultSink,
    utils::{CsvResultSink, inspect_panel},
};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

/// Factor portfolio backtests and robust allocation.
#[derive(Parser)]
#[command(name = "factorfolio")]
#[command(version)]
#[command(about = "Factor portfolio backtests and robust allocation", long_about = None)]
struct Cli {
    /// Verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    LongShort,
    LongOnly,
}

impl From<ModeArg> for PortfolioMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::LongShort => Self::LongShort,
            ModeArg::LongOnly => Self::LongOnly,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    MaxSharpe,
    MinVolatility,
}

impl From<MethodArg> for OptimizationMethod {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::MaxSharpe => Self::MaxSharpe,
            MethodArg::MinVolatility => Self::MinVolatility,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Form quantile portfolios and report their performance
    Backtest {
        /// Factor panel CSV
        #[arg(short, long)]
        panel: Option<PathBuf>,

        /// Factor-score column
        #[arg(short, long)]
        score: Option<String>,

        /// Grouping column
        #[arg(short, long)]
        group: Option<String>,

        /// Fraction of each partition per leg
        #[arg(short, long)]
        quantile: Option<f64>,

        /// Modes to run (repeatable)
        #[arg(short, long, value_enum)]
        mode: Vec<ModeArg>,

        /// Start every run on the first date of this group
        #[arg(long)]
        align_start_to: Option<String>,

        /// Directory for result tables
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Optimize an allocation and decompose its risk
    Optimize {
        /// Wide date x ticker return CSV; defaults to the formed portfolio's assets
        #[arg(short, long)]
        returns: Option<PathBuf>,

        /// Allocation objective
        #[arg(short, long, value_enum)]
        method: Option<MethodArg>,

        /// Annual risk-free rate
        #[arg(long)]
        risk_free_rate: Option<f64>,

        /// Directory for result tables
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Trace the efficient frontier
    Frontier {
        /// Wide date x ticker return CSV; defaults to the formed portfolio's assets
        #[arg(short, long)]
        returns: Option<PathBuf>,

        /// Number of target returns
        #[arg(short, long)]
        points: Option<usize>,

        /// Directory for result tables
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summarise coverage of the factor panel
    Inspect {
        /// Factor panel CSV
        #[arg(short, long)]
        panel: Option<PathBuf>,
    },

    /// Print or write a configuration with every default filled in
    InitConfig {
        /// Destination file; printed to stdout when omitted
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// Initialize logging based on verbosity level.
    fn init_logging(&self) -> Result<()> {
        let level = match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let subscriber = FmtSubscriber::builder().with_max_level(level).with_target(false).finish();
        tracing::subscriber::set_global_default(subscriber)
            .context("failed to set tracing subscriber")
    }

    fn load_config(&self) -> Result<PipelineConfig> {
        match &self.config {
            Some(path) => PipelineConfig::from_path(path)
                .with_context(|| format!("loading {}", path.display())),
            None => Ok(PipelineConfig::default()),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.init_logging()?;
    let mut config = cli.load_config()?;

    match cli.command {
        Commands::Backtest { panel, score, group, quantile, mode, align_start_to, output } => {
            override_opt(&mut config.data.panel, panel);
            if let Some(score) = score {
                config.data.score_column = score;
            }
            override_opt(&mut config.data.group_column, group);
            if let Some(quantile) = quantile {
                config.formation.quantile = quantile;
            }
            if !mode.is_empty() {
                config.formation.modes = mode.into_iter().map(Into::into).collect();
            }
            override_opt(&mut config.formation.align_start_to, align_start_to);
            override_output(&mut config, output);
            config.validate()?;
            backtest(&config)
        }
        Commands::Optimize { returns, method, risk_free_rate, output } => {
            override_opt(&mut config.data.returns, returns);
            if let Some(method) = method {
                config.optimizer.method = method.into();
            }
            if let Some(rf) = risk_free_rate {
                config.optimizer.config.risk_free_rate = rf;
            }
            override_output(&mut config, output);
            config.validate()?;
            optimize(&config)
        }
        Commands::Frontier { returns, points, output } => {
            override_opt(&mut config.data.returns, returns);
            if let Some(points) = points {
                config.optimizer.frontier_points = points;
            }
            override_output(&mut config, output);
            config.validate()?;
            frontier(&config)
        }
        Commands::Inspect { panel } => {
            override_opt(&mut config.data.panel, panel);
            let panel = load_panel(&config)?;
            println!("{}", inspect_panel(&panel));
            Ok(())
        }
        Commands::InitConfig { path, force } => init_config(&config, path.as_deref(), force),
    }
}

fn override_opt<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn override_output(config: &mut PipelineConfig, output: Option<PathBuf>) {
    if let Some(output) = output {
        config.data.output_dir = output;
    }
}

fn backtest(config: &PipelineConfig) -> Result<()> {
    let panel = load_panel(config)?;
    let results = run_backtests(&panel, config)?;

    println!(
        "{:<12} {:<12} {:>12} {:>10} {:>10} {:>12}",
        "group", "mode", "cumulative", "sharpe", "vol", "max_dd"
    );
    for run in results.runs() {
        let stats = &run.report.stats;
        println!(
            "{:<12} {:<12} {:>11.2}% {:>10.2} {:>9.2}% {:>11.2}%",
            run.group.as_deref().unwrap_or("all"),
            run.mode.label(),
            stats.cumulative_return * 100.0,
            stats.sharpe_ratio,
            stats.volatility * 100.0,
            stats.max_drawdown * 100.0,
        );
    }

    let mut sink = CsvResultSink::new(&config.data.output_dir);
    results.write_to(&mut sink)?;
    info!(dir = %config.data.output_dir.display(), "backtest tables written");
    Ok(())
}

/// Return matrix for allocation: the configured CSV, or the assets picked
/// by formation in the first configured mode.
fn allocation_matrix(config: &PipelineConfig) -> Result<ReturnMatrix> {
    if config.data.returns.is_some() {
        return Ok(load_returns(config)?);
    }
    if config.data.panel.is_none() {
        bail!("configure [data] returns or [data] panel");
    }
    let panel = load_panel(config)?;
    let mode = config.formation.modes.first().copied().unwrap_or_default();
    let formation = PortfolioFormer::with_config(config.formation.for_mode(mode)).form(&panel)?;
    Ok(formation.returns)
}

fn optimize(config: &PipelineConfig) -> Result<()> {
    let matrix = allocation_matrix(config)?;
    let outcome = run_allocation(&matrix, config)?;
    let performance = outcome.result.performance;

    println!("method:              {}", config.optimizer.method);
    println!("source:              {}", outcome.result.source);
    println!("expected return:     {:.2}%", performance.annual_return * 100.0);
    println!("volatility:          {:.2}%", performance.annual_volatility * 100.0);
    println!("sharpe ratio:        {:.3}", performance.sharpe_ratio);
    if !outcome.preparation.dropped_sparse.is_empty() || !outcome.preparation.dropped_flat.is_empty()
    {
        println!(
            "dropped:             {} sparse, {} flat",
            outcome.preparation.dropped_sparse.len(),
            outcome.preparation.dropped_flat.len()
        );
    }
    println!();
    println!("{:<14} {:>10} {:>10}", "ticker", "weight", "risk");
    for row in &outcome.risk {
        println!("{:<14} {:>9.2}% {:>9.2}%", row.ticker.as_str(), row.weight * 100.0, row.contribution * 100.0);
    }

    let mut sink = CsvResultSink::new(&config.data.output_dir);
    outcome.write_to(&mut sink)?;
    Ok(())
}

fn frontier(config: &PipelineConfig) -> Result<()> {
    let matrix = allocation_matrix(config)?;
    let frontier = run_frontier(&matrix, config)?;

    println!("{:>16} {:>12}", "expected_return", "volatility");
    for point in &frontier {
        println!("{:>15.2}% {:>11.2}%", point.expected_return * 100.0, point.volatility * 100.0);
    }

    let mut sink = CsvResultSink::new(&config.data.output_dir);
    sink.write("efficient_frontier", &mut frontier_frame(&frontier)?)?;
    Ok(())
}

fn init_config(config: &PipelineConfig, path: Option<&Path>, force: bool) -> Result<()> {
    let text = config.to_toml_string()?;
    match path {
        Some(path) => {
            if path.exists() && !force {
                bail!("{} exists, pass --force to overwrite", path.display());
            }
            std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "configuration written");
        }
        None => print!("{text}"),
    }
    Ok(())
}
