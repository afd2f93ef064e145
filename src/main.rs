use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dca_backtester::input_handler::{load_prices_csv, write_decisions_csv};
use dca_backtester::{Backtester, CalendarKind, Comparison, SimulationConfig, Strategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    /// Run both strategies and compare them
    Both,
    /// Contribute on the last business day of every month
    First,
    /// Contribute on the first new monthly low after the 11th, else at month end
    Cutoff,
}

const DEFAULT_LOG_DIRECTIVE: &str = "dca_backtester=info";

/// `RUST_LOG` when set and valid, otherwise the crate at info level.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// CSV file with "Date" and "Adj Close" columns
    #[arg(short, long, env = "DCA_PRICES", default_value = "sp500_data.csv")]
    prices: PathBuf,

    /// Wealth at the first price point
    #[arg(long, env = "DCA_INITIAL_INVESTMENT", default_value_t = 1.0)]
    initial_investment: f64,

    /// Amount added once per month
    #[arg(long, env = "DCA_MONTHLY_CONTRIBUTION", default_value_t = 1.0)]
    monthly_contribution: f64,

    /// Holiday calendar used to find month-end business days
    #[arg(long, value_enum, env = "DCA_CALENDAR", default_value_t = CalendarKind::Us)]
    calendar: CalendarKind,

    #[arg(short, long, value_enum, default_value_t = StrategyArg::Both)]
    strategy: StrategyArg,

    /// Write <strategy>_decisions.csv files into this directory
    #[arg(short, long, env = "DCA_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .init();

    let args = Args::parse();

    let prices = load_prices_csv(&args.prices)
        .with_context(|| format!("failed to load prices from {}", args.prices.display()))?;
    info!(path = %args.prices.display(), rows = prices.len(), "loaded prices");

    let config = SimulationConfig {
        initial_investment: args.initial_investment,
        monthly_contribution: args.monthly_contribution,
        ..SimulationConfig::default()
    };
    let backtester = Backtester::new(prices, config, args.calendar);

    let strategies: &[Strategy] = match args.strategy {
        StrategyArg::Both => &Strategy::ALL,
        StrategyArg::First => &[Strategy::First],
        StrategyArg::Cutoff => &[Strategy::Cutoff],
    };

    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let mut summaries = Vec::with_capacity(strategies.len());
    for &strategy in strategies {
        let (result, summary) = backtester
            .run(strategy)
            .with_context(|| format!("{strategy} strategy failed"))?;

        if let Some(dir) = &args.output_dir {
            let path = dir.join(format!("{strategy}_decisions.csv"));
            write_decisions_csv(&path, &result.decisions)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote decisions");
        }

        println!(
            "{:<8} final {:>14.4}  contributed {:>12.2}  contributions {:>5}  multiple {:>8.4}",
            summary.strategy.name(),
            summary.final_value,
            summary.total_contributed,
            summary.contributions,
            summary.growth_multiple,
        );
        summaries.push(summary);
    }

    if let [first, cutoff] = summaries[..] {
        let comparison = Comparison { first, cutoff };
        println!("cutoff edge over month end: {:+.4}%", comparison.cutoff_edge() * 100.0);
    }

    Ok(())
}
