mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::analysis::FinancialArgs;
use commands::valuation::DcfArgs;

/// Single-company equity valuation and investment scoring
#[derive(Parser)]
#[command(
    name = "eqv",
    version,
    about = "Single-company equity valuation and investment scoring",
    long_about = "Values one company from a handful of financial figures with decimal \
                  precision: market ratios, an automatic WACC, perpetuity and five-year \
                  projection DCF models, and a 0-100 investment score. Input comes from \
                  a JSON/YAML file, piped JSON, or individual flags."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis: WACC, ratios, both DCF models and the score
    Analyze(FinancialArgs),
    /// Estimate WACC from the company profile and leverage
    Wacc(FinancialArgs),
    /// Market ratios, interpretation bands and a preliminary verdict
    Ratios(FinancialArgs),
    /// Perpetuity and five-year projection DCF valuations
    Dcf(DcfArgs),
    /// Investment score and recommendation
    Score(FinancialArgs),
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

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analysis::run_analyze(args),
        Commands::Wacc(args) => commands::valuation::run_wacc(args),
        Commands::Ratios(args) => commands::valuation::run_ratios(args),
        Commands::Dcf(args) => commands::valuation::run_dcf(args),
        Commands::Score(args) => commands::valuation::run_score(args),
        Commands::Version => {
            println!("eqv {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
