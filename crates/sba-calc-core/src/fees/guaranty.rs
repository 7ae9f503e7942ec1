use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::closing_costs::{closing_costs_with, ClosingCostEstimate};
use super::schedule::{default_schedule, FeeSchedule};
use crate::types::*;
use crate::SbaCalcResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeInput {
    pub loan_amount: Money,
    /// Other 7(a) loans to the same borrower in the last 90 days; they are
    /// aggregated with this loan for tiering.
    #[serde(default)]
    pub previous_loans_in_90_days: Money,
    /// Overrides the FY 2026 table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_schedule: Option<FeeSchedule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeOutput {
    pub fiscal_year: u16,
    pub aggregate_amount: Money,
    pub guaranty_fee: Money,
    /// Display tier (flat, not blended).
    pub tier_percent: Percent,
    /// Fee as a percentage of the aggregate; reflects blending above $1M.
    pub effective_percent: Percent,
    pub closing_costs: ClosingCostEstimate,
    pub total_upfront_costs: Money,
}

// ---------------------------------------------------------------------------
// Core
// ---------------------------------------------------------------------------

fn percent_of(amount: Money, percent: Percent) -> Money {
    amount * percent / dec!(100)
}

/// Guaranty fee under the FY 2026 table.
pub fn guaranty_fee(loan_amount: Money, previous_loans_in_90_days: Money) -> Money {
    guaranty_fee_with(default_schedule(), loan_amount, previous_loans_in_90_days)
}

/// Guaranty fee under an injected table.
///
/// Loans to the same borrower within 90 days are aggregated. Above the
/// large-loan threshold the fee blends `base_percent` on the threshold amount
/// with `excess_percent` on the remainder; otherwise the first tier covering
/// the aggregate applies its flat percent to the whole aggregate. A
/// non-positive loan or aggregate yields zero. Rounded to cents.
pub fn guaranty_fee_with(
    schedule: &FeeSchedule,
    loan_amount: Money,
    previous_loans_in_90_days: Money,
) -> Money {
    let aggregate = loan_amount + previous_loans_in_90_days;
    if loan_amount <= Decimal::ZERO || aggregate <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let rule = &schedule.large_loan;
    if aggregate > rule.threshold {
        let on_threshold = percent_of(rule.threshold, rule.base_percent);
        let on_excess = percent_of(aggregate - rule.threshold, rule.excess_percent);
        return round_cents(on_threshold + on_excess);
    }

    match schedule.tier_for(aggregate) {
        Some(tier) => round_cents(percent_of(aggregate, tier.fee_percent)),
        // Only reachable when the tier table stops short of the blend threshold
        None => round_cents(percent_of(aggregate, rule.excess_percent)),
    }
}

/// Headline tier percentage for display.
///
/// Not authoritative for fee totals: above the top tier this returns the
/// excess percent rather than the blended rate.
pub fn fee_tier_percent(loan_amount: Money) -> Percent {
    fee_tier_percent_with(default_schedule(), loan_amount)
}

pub fn fee_tier_percent_with(schedule: &FeeSchedule, loan_amount: Money) -> Percent {
    schedule
        .tier_for(loan_amount)
        .map(|t| t.fee_percent)
        .unwrap_or(schedule.large_loan.excess_percent)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Guaranty fee, closing costs and total upfront cost for one loan.
pub fn calculate_fees(input: &FeeInput) -> SbaCalcResult<ComputationOutput<FeeOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let schedule = match &input.fee_schedule {
        Some(s) => {
            s.validate()?;
            s
        }
        None => default_schedule(),
    };

    if input.loan_amount <= Decimal::ZERO {
        warnings.push("Loan amount is not positive; fees reported as zero".to_string());
    }

    let aggregate = input.loan_amount + input.previous_loans_in_90_days;
    let fee = guaranty_fee_with(schedule, input.loan_amount, input.previous_loans_in_90_days);
    let effective_percent = if aggregate > Decimal::ZERO && !fee.is_zero() {
        (fee / aggregate * dec!(100)).round_dp(4)
    } else {
        Decimal::ZERO
    };

    if aggregate > schedule.large_loan.threshold {
        warnings.push(format!(
            "Aggregate {aggregate} exceeds {}; fee blends {}% and {}%",
            schedule.large_loan.threshold,
            schedule.large_loan.base_percent,
            schedule.large_loan.excess_percent
        ));
    }

    let closing = closing_costs_with(schedule, input.loan_amount);
    let total_upfront = fee + closing.total;

    let output = FeeOutput {
        fiscal_year: schedule.fiscal_year,
        aggregate_amount: aggregate,
        guaranty_fee: fee,
        tier_percent: fee_tier_percent_with(schedule, aggregate),
        effective_percent,
        closing_costs: closing,
        total_upfront_costs: total_upfront,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "loan_amount": input.loan_amount.to_string(),
        "previous_loans_in_90_days": input.previous_loans_in_90_days.to_string(),
        "fiscal_year": schedule.fiscal_year,
    });

    Ok(with_metadata(
        "SBA 7(a) tiered guaranty fee with 90-day aggregation",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}
