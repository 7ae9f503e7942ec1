use clap::Args;
use serde_json::Value;

use sba_calc_core::monte_carlo::value_at_risk::{self, RateRiskInput, DEFAULT_CONFIDENCE_LEVEL};
use sba_calc_core::monte_carlo::RateSimulationInput;

use crate::input;

/// Arguments for the variable-rate Monte Carlo simulation
#[derive(Args)]
pub struct MonteCarloArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long, alias = "amount")]
    pub principal: Option<f64>,

    /// Current prime rate in percent
    #[arg(long, alias = "prime")]
    pub current_prime_rate: Option<f64>,

    /// Margin over prime in percent
    #[arg(long)]
    pub margin: Option<f64>,

    /// Term in years
    #[arg(long, alias = "term")]
    pub term_years: Option<f64>,

    /// Number of simulated rate paths
    #[arg(long, default_value_t = 10_000)]
    pub scenarios: u32,

    /// Annual volatility of prime in percentage points
    #[arg(long, default_value_t = 2.0)]
    pub volatility: f64,

    /// Long-run prime level the walk reverts toward
    #[arg(long, default_value_t = 5.0)]
    pub long_run_mean: f64,

    /// Seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Worker threads to spread scenarios across
    #[arg(long)]
    pub workers: Option<usize>,

    /// Cost to measure value at risk against
    #[arg(long)]
    pub baseline_cost: Option<f64>,

    /// Percentile for value at risk (0.10, 0.25, 0.50, 0.75 or 0.90)
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE_LEVEL)]
    pub confidence_level: f64,
}

pub fn run_monte_carlo(args: MonteCarloArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mc_input: RateRiskInput = match input::structured(args.input.as_deref())? {
        Some(m) => m,
        None => RateRiskInput {
            simulation: RateSimulationInput {
                principal: args
                    .principal
                    .ok_or("--principal is required (or provide --input)")?,
                current_prime_rate: args
                    .current_prime_rate
                    .ok_or("--current-prime-rate is required (or provide --input)")?,
                margin: args
                    .margin
                    .ok_or("--margin is required (or provide --input)")?,
                term_years: args
                    .term_years
                    .ok_or("--term-years is required (or provide --input)")?,
                scenarios: args.scenarios,
                volatility: args.volatility,
                long_run_mean: args.long_run_mean,
                seed: args.seed,
                workers: args.workers,
            },
            baseline_cost: args.baseline_cost,
            confidence_level: args.confidence_level,
        },
    };
    let result = value_at_risk::run_rate_simulation(&mc_input)?;
    Ok(serde_json::to_value(result)?)
}
