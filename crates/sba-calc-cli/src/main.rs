mod commands;
mod input;
mod logger;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::amortization::{AprArgs, CompareArgs, PaymentArgs, ScheduleArgs};
use commands::analysis::{AnalyzeArgs, TemplatesArgs};
use commands::dscr::{DscrArgs, MaxPaymentArgs, MinEbitdaArgs};
use commands::fees::{ClosingCostsArgs, GuarantyFeeArgs};
use commands::monte_carlo::MonteCarloArgs;

/// SBA 7(a) loan calculations
#[derive(Parser)]
#[command(
    name = "sbacalc",
    version,
    about = "SBA 7(a) loan calculations",
    long_about = "Payments, amortization schedules, APR with fees, guaranty fees, \
                  closing costs, debt service coverage and variable-rate risk for \
                  SBA 7(a) loans, computed with decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Fee schedule file (.json or .yaml) replacing the built-in FY 2026 table
    #[arg(long, global = true)]
    fee_schedule: Option<String>,

    /// Log calculation details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Monthly payment, total payments and total interest
    Payment(PaymentArgs),
    /// Month-by-month amortization schedule
    Schedule(ScheduleArgs),
    /// APR including the guaranty fee and closing costs
    Apr(AprArgs),
    /// Compare a fixed rate with prime plus margin
    Compare(CompareArgs),
    /// SBA guaranty fee with 90-day aggregation, plus closing costs
    GuarantyFee(GuarantyFeeArgs),
    /// Estimate closing costs for a loan amount
    ClosingCosts(ClosingCostsArgs),
    /// Debt service coverage ratio and eligibility
    Dscr(DscrArgs),
    /// Largest monthly payment a business can support
    MaxPayment(MaxPaymentArgs),
    /// EBITDA needed to reach a target coverage
    MinEbitda(MinEbitdaArgs),
    /// Simulate prime-rate paths for a variable-rate loan
    MonteCarlo(MonteCarloArgs),
    /// Full loan analysis (payment, fees, APR, DSCR, schedule)
    Analyze(AnalyzeArgs),
    /// List industry templates
    Templates(TemplatesArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    JsonCompact,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);

    let fee_schedule = match cli.fee_schedule.as_deref().map(input::file::read_fee_schedule) {
        Some(Ok(s)) => Some(s),
        Some(Err(e)) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
        None => None,
    };
    let fees = fee_schedule.as_ref();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Payment(args) => commands::amortization::run_payment(args),
        Commands::Schedule(args) => commands::amortization::run_schedule(args),
        Commands::Apr(args) => commands::amortization::run_apr(args),
        Commands::Compare(args) => commands::amortization::run_compare(args),
        Commands::GuarantyFee(args) => commands::fees::run_guaranty_fee(args, fees),
        Commands::ClosingCosts(args) => commands::fees::run_closing_costs(args, fees),
        Commands::Dscr(args) => commands::dscr::run_dscr(args),
        Commands::MaxPayment(args) => commands::dscr::run_max_payment(args),
        Commands::MinEbitda(args) => commands::dscr::run_min_ebitda(args),
        Commands::MonteCarlo(args) => commands::monte_carlo::run_monte_carlo(args),
        Commands::Analyze(args) => commands::analysis::run_analyze(args, fees),
        Commands::Templates(args) => commands::analysis::run_templates(args),
        Commands::Version => {
            println!("sbacalc {}", env!("CARGO_PKG_VERSION"));
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
