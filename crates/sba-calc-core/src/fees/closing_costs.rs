use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::schedule::{default_schedule, CostRange, FeeSchedule};
use crate::types::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosingCostEstimate {
    pub packaging_fee: Money,
    pub appraisal_fee: Money,
    pub environmental_review: Money,
    pub legal_fees: Money,
    pub total: Money,
}

/// Closing costs under the FY 2026 ranges.
pub fn closing_costs(loan_amount: Money) -> ClosingCostEstimate {
    closing_costs_with(default_schedule(), loan_amount)
}

/// Midpoint of each cost range, scaled by loan size relative to the baseline
/// and capped at the configured multiple. Components are whole dollars.
pub fn closing_costs_with(schedule: &FeeSchedule, loan_amount: Money) -> ClosingCostEstimate {
    let scaling = &schedule.closing_cost_scaling;
    let scale = if scaling.baseline_loan_amount > Decimal::ZERO {
        (loan_amount / scaling.baseline_loan_amount)
            .min(scaling.max_scale)
            .max(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };

    let scaled = |range: &CostRange| round_whole(range.midpoint() * scale);

    let ranges = &schedule.closing_costs;
    let packaging_fee = scaled(&ranges.packaging_fee);
    let appraisal_fee = scaled(&ranges.appraisal_fee);
    let environmental_review = scaled(&ranges.environmental_review);
    let legal_fees = scaled(&ranges.legal_fees);

    ClosingCostEstimate {
        packaging_fee,
        appraisal_fee,
        environmental_review,
        legal_fees,
        total: packaging_fee + appraisal_fee + environmental_review + legal_fees,
    }
}
