use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::payment::{self, MONTHS_PER_YEAR};
use crate::types::*;
use crate::SbaCalcResult;

/// Stop once the present-value residual is below a hundredth of a cent.
const PV_TOLERANCE: Decimal = dec!(0.0001);
const MAX_APR_ITERATIONS: u32 = 100;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AprInput {
    pub principal: Money,
    pub annual_rate: Percent,
    pub term_years: Years,
    /// Upfront fee financed into the loan.
    #[serde(default)]
    pub guaranty_fee: Money,
    /// Costs paid out of pocket, reducing net proceeds.
    #[serde(default)]
    pub closing_costs: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AprOutput {
    pub apr: Percent,
    pub stated_rate: Percent,
    /// APR minus the stated note rate.
    pub fee_spread: Percent,
    pub total_financed: Money,
    pub net_proceeds: Money,
    pub monthly_payment: Money,
    pub iterations: u32,
    pub converged: bool,
}

/// Raw solver result before rounding for display.
#[derive(Debug, Clone, Copy)]
struct AprSolution {
    monthly_rate: Decimal,
    iterations: u32,
    converged: bool,
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

/// Present value of `n` level payments at monthly rate `i`, and its derivative
/// with respect to `i`. Returns None when (1+i)^n leaves Decimal range.
fn pv_and_derivative(payment: Money, i: Decimal, n: Decimal) -> Option<(Decimal, Decimal)> {
    if i.is_zero() {
        // Limits as i → 0
        return Some((payment * n, -payment * n * (n + Decimal::ONE) / dec!(2)));
    }

    let one_plus_i = Decimal::ONE + i;
    let growth = one_plus_i.checked_powd(n)?;
    if growth.is_zero() {
        return None;
    }
    let discount = Decimal::ONE / growth;
    let annuity = (Decimal::ONE - discount) / i;

    let pv = payment * annuity;
    let dpv = payment * (n * discount / one_plus_i / i - annuity / i);
    Some((pv, dpv))
}

/// Newton-Raphson on the monthly rate, starting from the stated rate.
fn solve_monthly_rate(payment: Money, n: Decimal, net_proceeds: Money, guess: Decimal) -> AprSolution {
    let mut i = guess;

    for iteration in 0..MAX_APR_ITERATIONS {
        let (pv, dpv) = match pv_and_derivative(payment, i, n) {
            Some(v) => v,
            None => {
                tracing::warn!(monthly_rate = %i, "APR solver left the representable range");
                return AprSolution {
                    monthly_rate: i,
                    iterations: iteration,
                    converged: false,
                };
            }
        };

        let residual = pv - net_proceeds;
        if residual.abs() < PV_TOLERANCE {
            return AprSolution {
                monthly_rate: i,
                iterations: iteration,
                converged: true,
            };
        }

        if dpv.is_zero() {
            tracing::warn!(monthly_rate = %i, %residual, "APR solver hit a flat derivative");
            return AprSolution {
                monthly_rate: i,
                iterations: iteration,
                converged: false,
            };
        }

        i -= residual / dpv;

        // Guard against divergence
        if i < dec!(-0.99) {
            i = dec!(-0.99);
        } else if i > dec!(10) {
            i = dec!(10);
        }
    }

    tracing::warn!(
        iterations = MAX_APR_ITERATIONS,
        monthly_rate = %i,
        "APR solver did not converge; returning last iterate"
    );
    AprSolution {
        monthly_rate: i,
        iterations: MAX_APR_ITERATIONS,
        converged: false,
    }
}

fn solve(input: &AprInput) -> Option<(AprSolution, Money)> {
    if !payment::is_amortizable(input.principal, input.annual_rate, input.term_years) {
        return None;
    }

    let total_financed = input.principal + input.guaranty_fee;
    let net_proceeds = input.principal - input.closing_costs;
    if net_proceeds <= Decimal::ZERO {
        return None;
    }

    let monthly = payment::monthly_payment(total_financed, input.annual_rate, input.term_years);
    if monthly <= Decimal::ZERO {
        return None;
    }

    let n = input.term_years * MONTHS_PER_YEAR;
    let guess = payment::monthly_rate(input.annual_rate);
    Some((solve_monthly_rate(monthly, n, net_proceeds, guess), monthly))
}

fn to_annual_percent(monthly_rate: Decimal) -> Percent {
    round_cents(monthly_rate * MONTHS_PER_YEAR * dec!(100))
}

/// Annual percentage rate including a financed guaranty fee and out-of-pocket
/// closing costs.
///
/// The payment is computed on `principal + guaranty_fee` at the stated rate;
/// the APR is the rate at which that payment stream is worth
/// `principal − closing_costs`. Returns zero for terms that cannot be
/// amortized or when closing costs consume the proceeds.
pub fn calculate_apr(
    principal: Money,
    annual_rate: Percent,
    term_years: Years,
    guaranty_fee: Money,
    closing_costs: Money,
) -> Percent {
    let input = AprInput {
        principal,
        annual_rate,
        term_years,
        guaranty_fee,
        closing_costs,
    };
    match solve(&input) {
        Some((solution, _)) => to_annual_percent(solution.monthly_rate),
        None => Decimal::ZERO,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// APR with solver diagnostics and the cost components that drive it.
pub fn solve_apr(input: &AprInput) -> SbaCalcResult<ComputationOutput<AprOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let total_financed = input.principal + input.guaranty_fee;
    let net_proceeds = input.principal - input.closing_costs;

    let output = match solve(input) {
        Some((solution, monthly)) => {
            if !solution.converged {
                warnings.push(format!(
                    "APR solver stopped after {} iterations without reaching tolerance",
                    solution.iterations
                ));
            }
            let apr = to_annual_percent(solution.monthly_rate);
            AprOutput {
                apr,
                stated_rate: input.annual_rate,
                fee_spread: apr - input.annual_rate,
                total_financed,
                net_proceeds,
                monthly_payment: monthly,
                iterations: solution.iterations,
                converged: solution.converged,
            }
        }
        None => {
            warnings.push(
                "Loan terms cannot be amortized or costs exceed proceeds; APR reported as zero"
                    .to_string(),
            );
            AprOutput {
                apr: Decimal::ZERO,
                stated_rate: input.annual_rate,
                fee_spread: Decimal::ZERO,
                total_financed,
                net_proceeds,
                monthly_payment: Decimal::ZERO,
                iterations: 0,
                converged: false,
            }
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "APR via Newton-Raphson on monthly rate (financed fee, out-of-pocket costs)",
        input,
        warnings,
        elapsed,
        output,
    ))
}
