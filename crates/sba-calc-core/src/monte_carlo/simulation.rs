use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Uniform;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Instant;

use crate::amortization::payment::monthly_payment_f64;
use crate::error::SbaCalcError;
use crate::types::round_cents_f64;
use crate::SbaCalcResult;

/// Annual speed at which prime reverts toward its long-run mean.
const MEAN_REVERSION_SPEED: f64 = 0.1;
/// Prime never falls below a quarter point.
const PRIME_RATE_FLOOR: f64 = 0.25;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Variable-rate loan and rate-process parameters. Rates are percentages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSimulationInput {
    pub principal: f64,
    pub current_prime_rate: f64,
    /// Lender margin over prime.
    pub margin: f64,
    pub term_years: f64,
    /// Number of simulated rate paths.
    #[serde(default = "default_scenarios")]
    pub scenarios: u32,
    /// Annual volatility of prime, in percentage points.
    #[serde(default = "default_volatility")]
    pub volatility: f64,
    /// Level prime reverts toward.
    #[serde(default = "default_long_run_mean")]
    pub long_run_mean: f64,
    /// Optional seed for reproducibility.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Threads to spread scenarios across (default 1).
    #[serde(default)]
    pub workers: Option<usize>,
}

fn default_scenarios() -> u32 {
    10_000
}

fn default_volatility() -> f64 {
    2.0
}

fn default_long_run_mean() -> f64 {
    5.0
}

impl RateSimulationInput {
    /// Input with the default scenario count, volatility and long-run mean.
    pub fn new(principal: f64, current_prime_rate: f64, margin: f64, term_years: f64) -> Self {
        Self {
            principal,
            current_prime_rate,
            margin,
            term_years,
            scenarios: default_scenarios(),
            volatility: default_volatility(),
            long_run_mean: default_long_run_mean(),
            seed: None,
            workers: None,
        }
    }

    fn months(&self) -> u32 {
        (self.term_years * 12.0).floor() as u32
    }
}

/// Payment statistics for one path (or an aggregate of paths).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McStats {
    pub avg_payment: f64,
    pub max_payment: f64,
    pub min_payment: f64,
    pub total_interest: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McPercentiles {
    pub p10: McStats,
    pub p25: McStats,
    pub p50: McStats,
    pub p75: McStats,
    pub p90: McStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub scenarios: u32,
    pub time_horizon_years: f64,
    /// Prime plus margin today.
    pub current_rate: f64,
    /// Paths ranked by total cost.
    pub percentiles: McPercentiles,
    pub worst_case: McStats,
    pub best_case: McStats,
    /// Field-wise mean across all paths.
    pub expected: McStats,
}

// ---------------------------------------------------------------------------
// Path simulation
// ---------------------------------------------------------------------------

/// One mean-reverting prime path; the loan re-amortizes its remaining balance
/// every month at the new rate over the remaining term.
fn simulate_path(rng: &mut StdRng, input: &RateSimulationInput, shock: Option<&Uniform>) -> McStats {
    let months = input.months();
    let principal = input.principal.max(0.0);

    let mut prime = input.current_prime_rate;
    let mut balance = principal;
    let mut total_payment = 0.0_f64;
    let mut min_payment = f64::INFINITY;
    let mut max_payment = 0.0_f64;

    for month in 1..=months {
        let random_shock = match shock {
            Some(dist) => rng.sample::<f64, _>(dist),
            None => 0.0,
        };
        let mean_reversion = MEAN_REVERSION_SPEED * (input.long_run_mean - prime) / 12.0;
        prime = (prime + mean_reversion + random_shock).max(PRIME_RATE_FLOOR);

        let effective_rate = prime + input.margin;
        let remaining_years = input.term_years - (month - 1) as f64 / 12.0;
        let payment = monthly_payment_f64(balance, effective_rate, remaining_years);

        let interest = balance * effective_rate.max(0.0) / 1200.0;
        balance = (balance + interest - payment).max(0.0);

        total_payment += payment;
        min_payment = min_payment.min(payment);
        max_payment = max_payment.max(payment);
    }

    let avg_payment = total_payment / months as f64;

    McStats {
        avg_payment: round_cents_f64(avg_payment),
        max_payment: round_cents_f64(max_payment),
        min_payment: round_cents_f64(min_payment),
        total_interest: round_cents_f64(total_payment - principal),
        total_cost: round_cents_f64(total_payment),
    }
}

fn worker_rng(seed: Option<u64>, worker: usize) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s.wrapping_add(worker as u64)),
        None => StdRng::from_entropy(),
    }
}

/// Split `total` scenarios into `workers` near-equal batches.
fn partition(total: u32, workers: usize) -> Vec<u32> {
    let workers = workers.clamp(1, total.max(1) as usize) as u32;
    let base = total / workers;
    let remainder = total % workers;
    (0..workers)
        .map(|w| base + u32::from(w < remainder))
        .collect()
}

struct Batch<'a> {
    input: &'a RateSimulationInput,
    shock: Option<&'a Uniform>,
    cancel: &'a AtomicBool,
    completed: &'a AtomicU32,
}

impl Batch<'_> {
    fn run(&self, worker: usize, count: u32) -> SbaCalcResult<Vec<McStats>> {
        let mut rng = worker_rng(self.input.seed, worker);
        let mut paths = Vec::with_capacity(count as usize);
        for _ in 0..count {
            if self.cancel.load(Ordering::Relaxed) {
                return Err(SbaCalcError::Cancelled {
                    completed: self.completed.load(Ordering::Relaxed),
                    requested: self.input.scenarios,
                });
            }
            paths.push(simulate_path(&mut rng, self.input, self.shock));
            self.completed.fetch_add(1, Ordering::Relaxed);
        }
        Ok(paths)
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

fn mean_stats(paths: &[McStats]) -> McStats {
    let n = paths.len() as f64;
    let mean = |f: fn(&McStats) -> f64| round_cents_f64(paths.iter().map(f).sum::<f64>() / n);
    McStats {
        avg_payment: mean(|s| s.avg_payment),
        max_payment: mean(|s| s.max_payment),
        min_payment: mean(|s| s.min_payment),
        total_interest: mean(|s| s.total_interest),
        total_cost: mean(|s| s.total_cost),
    }
}

/// Rank paths by total cost and read off percentiles at index floor(n·p).
fn summarize(mut paths: Vec<McStats>, input: &RateSimulationInput) -> MonteCarloResult {
    paths.sort_by(|a, b| {
        a.total_cost
            .partial_cmp(&b.total_cost)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let last = paths.len() - 1;
    let at = |p: f64| paths[((paths.len() as f64 * p).floor() as usize).min(last)].clone();

    MonteCarloResult {
        scenarios: input.scenarios,
        time_horizon_years: input.term_years,
        current_rate: input.current_prime_rate + input.margin,
        percentiles: McPercentiles {
            p10: at(0.10),
            p25: at(0.25),
            p50: at(0.50),
            p75: at(0.75),
            p90: at(0.90),
        },
        worst_case: paths[last].clone(),
        best_case: paths[0].clone(),
        expected: mean_stats(&paths),
    }
}

fn validate(input: &RateSimulationInput) -> SbaCalcResult<()> {
    let numbers = [
        ("principal", input.principal),
        ("current_prime_rate", input.current_prime_rate),
        ("margin", input.margin),
        ("term_years", input.term_years),
        ("volatility", input.volatility),
        ("long_run_mean", input.long_run_mean),
    ];
    for (field, value) in numbers {
        if !value.is_finite() {
            return Err(SbaCalcError::InvalidInput {
                field: field.into(),
                reason: "Must be a finite number".into(),
            });
        }
    }
    if input.scenarios == 0 {
        return Err(SbaCalcError::InvalidInput {
            field: "scenarios".into(),
            reason: "At least one scenario is required".into(),
        });
    }
    if input.months() == 0 {
        return Err(SbaCalcError::InvalidInput {
            field: "term_years".into(),
            reason: "Term must cover at least one month".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Simulate `scenarios` prime-rate paths for a variable-rate loan.
///
/// Prime follows a mean-reverting walk with a uniform monthly shock of
/// ±volatility/√12, floored at 0.25%. Paths are independent; with a seed and
/// a fixed worker count the result is reproducible.
pub fn run_monte_carlo_simulation(input: &RateSimulationInput) -> SbaCalcResult<MonteCarloResult> {
    let never = AtomicBool::new(false);
    run_monte_carlo_simulation_with_cancel(input, &never)
}

/// As [`run_monte_carlo_simulation`], stopping with [`SbaCalcError::Cancelled`]
/// once `cancel` is set.
pub fn run_monte_carlo_simulation_with_cancel(
    input: &RateSimulationInput,
    cancel: &AtomicBool,
) -> SbaCalcResult<MonteCarloResult> {
    validate(input)?;
    let start = Instant::now();

    // The shock is symmetric, so only the magnitude matters
    let monthly_volatility = input.volatility.abs() / 12.0_f64.sqrt();
    let shock = if monthly_volatility > 0.0 {
        Some(
            Uniform::new(-monthly_volatility, monthly_volatility).map_err(|e| {
                SbaCalcError::InvalidInput {
                    field: "volatility".into(),
                    reason: format!("Invalid Uniform parameters: {e}"),
                }
            })?,
        )
    } else {
        None
    };

    let batches = partition(input.scenarios, input.workers.unwrap_or(1));
    tracing::info!(
        scenarios = input.scenarios,
        workers = batches.len(),
        months = input.months(),
        "starting rate simulation"
    );

    let completed = AtomicU32::new(0);
    let batch = Batch {
        input,
        shock: shock.as_ref(),
        cancel,
        completed: &completed,
    };

    let paths = if batches.len() == 1 {
        batch.run(0, batches[0])?
    } else {
        let results: Vec<SbaCalcResult<Vec<McStats>>> = std::thread::scope(|scope| {
            let handles: Vec<_> = batches
                .iter()
                .enumerate()
                .map(|(w, &count)| {
                    let batch = &batch;
                    scope.spawn(move || batch.run(w, count))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });

        let mut paths = Vec::with_capacity(input.scenarios as usize);
        for r in results {
            paths.extend(r?);
        }
        paths
    };

    if let Err(e) = cancel_check(cancel, &completed, input) {
        tracing::warn!("rate simulation cancelled");
        return Err(e);
    }

    let result = summarize(paths, input);
    tracing::debug!(
        elapsed_us = start.elapsed().as_micros() as u64,
        p50_total_cost = result.percentiles.p50.total_cost,
        "rate simulation finished"
    );
    Ok(result)
}

/// A cancel raised after the last scenario still aborts the run.
fn cancel_check(
    cancel: &AtomicBool,
    completed: &AtomicU32,
    input: &RateSimulationInput,
) -> SbaCalcResult<()> {
    if cancel.load(Ordering::Relaxed) {
        return Err(SbaCalcError::Cancelled {
            completed: completed.load(Ordering::Relaxed),
            requested: input.scenarios,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
