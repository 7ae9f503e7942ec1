use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use super::simulation::{
    run_monte_carlo_simulation_with_cancel, MonteCarloResult, RateSimulationInput,
};
use crate::amortization::payment::monthly_payment_f64;
use crate::error::SbaCalcError;
use crate::types::*;
use crate::SbaCalcResult;

pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.90;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateRiskInput {
    #[serde(flatten)]
    pub simulation: RateSimulationInput,
    /// Cost to compare against; defaults to holding today's rate for the
    /// whole term.
    #[serde(default)]
    pub baseline_cost: Option<f64>,
    /// One of 0.10, 0.25, 0.50, 0.75, 0.90.
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
}

fn default_confidence_level() -> f64 {
    DEFAULT_CONFIDENCE_LEVEL
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateRiskOutput {
    pub simulation: MonteCarloResult,
    pub baseline_cost: f64,
    pub confidence_level: f64,
    /// Percentile total cost minus the baseline (negative when cheaper).
    pub value_at_risk: f64,
}

/// Extra cost over `baseline_cost` at one of the five reported percentiles.
///
/// The confidence level is matched after rounding to whole percent, so
/// 0.9 and 0.90 both select p90; any other level is rejected.
pub fn calculate_value_at_risk(
    result: &MonteCarloResult,
    baseline_cost: f64,
    confidence_level: f64,
) -> SbaCalcResult<f64> {
    let p = &result.percentiles;
    let stats = match (confidence_level * 100.0).round() as i64 {
        10 => &p.p10,
        25 => &p.p25,
        50 => &p.p50,
        75 => &p.p75,
        90 => &p.p90,
        _ => return Err(SbaCalcError::InvalidConfidenceLevel(confidence_level)),
    };
    Ok(round_cents_f64(stats.total_cost - baseline_cost))
}

/// Total cost if today's prime plus margin held for the whole term.
fn constant_rate_cost(input: &RateSimulationInput) -> f64 {
    let months = (input.term_years * 12.0).floor();
    let payment = monthly_payment_f64(
        input.principal,
        input.current_prime_rate + input.margin,
        input.term_years,
    );
    round_cents_f64(payment * months)
}

/// Run the rate simulation and report value at risk against a baseline.
pub fn run_rate_simulation(input: &RateRiskInput) -> SbaCalcResult<ComputationOutput<RateRiskOutput>> {
    let never = AtomicBool::new(false);
    run_rate_simulation_with_cancel(input, &never)
}

pub fn run_rate_simulation_with_cancel(
    input: &RateRiskInput,
    cancel: &AtomicBool,
) -> SbaCalcResult<ComputationOutput<RateRiskOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let simulation = run_monte_carlo_simulation_with_cancel(&input.simulation, cancel)?;

    let baseline_cost = match input.baseline_cost {
        Some(b) => b,
        None => {
            warnings.push(
                "No baseline cost supplied; using today's rate held for the full term".to_string(),
            );
            constant_rate_cost(&input.simulation)
        }
    };
    let value_at_risk = calculate_value_at_risk(&simulation, baseline_cost, input.confidence_level)?;

    if input.simulation.scenarios < 100 {
        warnings.push(format!(
            "Only {} scenarios; percentiles will be noisy",
            input.simulation.scenarios
        ));
    }
    if input.simulation.seed.is_none() {
        warnings.push("No seed supplied; results are not reproducible".to_string());
    }

    let output = RateRiskOutput {
        simulation,
        baseline_cost,
        confidence_level: input.confidence_level,
        value_at_risk,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata_f64(
        "Monte Carlo mean-reverting prime rate simulation with percentile VaR",
        input,
        warnings,
        elapsed,
        output,
    ))
}
