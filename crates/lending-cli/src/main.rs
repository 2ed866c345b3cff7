mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::payments::SuggestPaymentArgs;
use commands::rates::{ResolveRateArgs, ValidateTableArgs};
use commands::recommend::RecommendArgs;
use commands::simulate::SimulateArgs;

/// Lending back-office calculators
#[derive(Parser)]
#[command(
    name = "lendctl",
    version,
    about = "Lending back-office calculators",
    long_about = "Loan simulation with decimal precision: Price-method schedules, \
                  tiered rate resolution, credit recommendations and late-payment \
                  quotes, sharing the exact arithmetic the back office runs."
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
    /// Simulate a loan: installment amount, schedule and totals
    Simulate(SimulateArgs),
    /// Resolve the monthly rate for a tenor against a rate table
    ResolveRate(ResolveRateArgs),
    /// Validate a rate table's tier set
    ValidateTable(ValidateTableArgs),
    /// Suggest a principal and maximum installment from income
    Recommend(RecommendArgs),
    /// Quote the suggested collection amount for a (possibly late) payment
    SuggestPayment(SuggestPaymentArgs),
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
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::simulate::run_simulate(args),
        Commands::ResolveRate(args) => commands::rates::run_resolve_rate(args),
        Commands::ValidateTable(args) => commands::rates::run_validate_table(args),
        Commands::Recommend(args) => commands::recommend::run_recommend(args),
        Commands::SuggestPayment(args) => commands::payments::run_suggest_payment(args),
        Commands::Version => {
            println!("lendctl {}", env!("CARGO_PKG_VERSION"));
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
