use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use sba_calc_core::fees::closing_costs::closing_costs_with;
use sba_calc_core::fees::guaranty::{self, FeeInput};
use sba_calc_core::fees::schedule::default_schedule;
use sba_calc_core::fees::FeeSchedule;

use crate::input;

/// Arguments for the guaranty fee calculation
#[derive(Args)]
pub struct GuarantyFeeArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount
    #[arg(long, alias = "amount")]
    pub loan_amount: Option<Decimal>,

    /// Other 7(a) loans to the same borrower in the last 90 days
    #[arg(long, default_value = "0")]
    pub previous_loans: Decimal,
}

/// Arguments for the closing cost estimate
#[derive(Args)]
pub struct ClosingCostsArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount
    #[arg(long, alias = "amount")]
    pub loan_amount: Option<Decimal>,
}

#[derive(Deserialize)]
struct ClosingCostsInput {
    loan_amount: Decimal,
}

pub fn run_guaranty_fee(
    args: GuarantyFeeArgs,
    fee_schedule: Option<&FeeSchedule>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut fee_input: FeeInput = match input::structured(args.input.as_deref())? {
        Some(f) => f,
        None => FeeInput {
            loan_amount: args
                .loan_amount
                .ok_or("--loan-amount is required (or provide --input)")?,
            previous_loans_in_90_days: args.previous_loans,
            fee_schedule: None,
        },
    };
    // A schedule embedded in the input wins over --fee-schedule
    if fee_input.fee_schedule.is_none() {
        fee_input.fee_schedule = fee_schedule.cloned();
    }
    let result = guaranty::calculate_fees(&fee_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_closing_costs(
    args: ClosingCostsArgs,
    fee_schedule: Option<&FeeSchedule>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_amount = match input::structured::<ClosingCostsInput>(args.input.as_deref())? {
        Some(c) => c.loan_amount,
        None => args
            .loan_amount
            .ok_or("--loan-amount is required (or provide --input)")?,
    };
    let schedule = fee_schedule.unwrap_or_else(|| default_schedule());
    let estimate = closing_costs_with(schedule, loan_amount);
    Ok(serde_json::to_value(estimate)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sba_calc_core::fees::closing_costs::ClosingCostEstimate;
    use sba_calc_core::fees::schedule::CostRange;
    use std::path::{Path, PathBuf};

    fn input_file(name: &str, loan_amount: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("sbacalc-{}-{name}.json", std::process::id()));
        std::fs::write(&path, format!(r#"{{"loan_amount": "{loan_amount}"}}"#)).unwrap();
        path
    }

    fn closing_args(path: &Path) -> ClosingCostsArgs {
        ClosingCostsArgs {
            input: Some(path.to_string_lossy().into_owned()),
            loan_amount: None,
        }
    }

    #[test]
    fn test_closing_costs_default_schedule() {
        let path = input_file("default", "500000");
        let value = run_closing_costs(closing_args(&path), None).unwrap();
        std::fs::remove_file(&path).ok();

        let estimate: ClosingCostEstimate = serde_json::from_value(value).unwrap();
        assert_eq!(estimate.total, Decimal::from(16000));
        assert_eq!(estimate.legal_fees, Decimal::from(3250));
    }

    #[test]
    fn test_closing_costs_custom_schedule() {
        let mut schedule = FeeSchedule::fy2026();
        schedule.closing_costs.legal_fees = CostRange::new(Decimal::ZERO, Decimal::ZERO);

        let path = input_file("custom", "500000");
        let value = run_closing_costs(closing_args(&path), Some(&schedule)).unwrap();
        std::fs::remove_file(&path).ok();

        let estimate: ClosingCostEstimate = serde_json::from_value(value).unwrap();
        assert_eq!(estimate.legal_fees, Decimal::ZERO);
        assert_eq!(estimate.total, Decimal::from(12750));
    }
}
