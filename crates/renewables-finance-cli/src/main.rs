mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use commands::financing::{AssetFinanceArgs, SizeDebtArgs};
use commands::period::PeriodArgs;
use commands::revenue::RevenueArgs;
use commands::risk::EarArgs;
use commands::statements::StatementsArgs;
use commands::xirr::XirrArgs;

/// Renewable energy portfolio financial models
#[derive(Parser)]
#[command(
    name = "rfm",
    version,
    about = "Renewable energy portfolio financial models",
    long_about = "A CLI for forecasting revenue, sizing project debt, building platform \
                  financial statements and running earnings-at-risk simulations for \
                  portfolios of solar, wind and storage assets, with decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log progress to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a period label or generate a timeline
    Period(PeriodArgs),
    /// Forecast portfolio revenue by period
    Revenue(RevenueArgs),
    /// Size debt against a CFADS profile
    SizeDebt(SizeDebtArgs),
    /// Construction, debt and statements for a single asset
    AssetFinance(AssetFinanceArgs),
    /// Platform income statement, cash flow and balance sheet
    Statements(StatementsArgs),
    /// Monte Carlo earnings at risk on portfolio revenue
    Ear(EarArgs),
    /// XIRR over dated cash flows
    Xirr(XirrArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Period(args) => commands::period::run_period(args),
        Commands::Revenue(args) => commands::revenue::run_revenue(args),
        Commands::SizeDebt(args) => commands::financing::run_size_debt(args),
        Commands::AssetFinance(args) => commands::financing::run_asset_finance(args),
        Commands::Statements(args) => commands::statements::run_statements(args),
        Commands::Ear(args) => commands::risk::run_ear(args),
        Commands::Xirr(args) => commands::xirr::run_xirr(args),
        Commands::Version => {
            println!("rfm {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
