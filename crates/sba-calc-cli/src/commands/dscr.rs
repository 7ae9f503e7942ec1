use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use sba_calc_core::dscr::coverage::{self, CoverageInput};
use sba_calc_core::dscr::{max_loan_payment, minimum_ebitda, DscrInput, DEFAULT_TARGET_DSCR};

use crate::input;

/// Arguments for debt service coverage
#[derive(Args)]
pub struct DscrArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Annual EBITDA
    #[arg(long, alias = "ebitda")]
    pub annual_ebitda: Option<Decimal>,

    /// Annual payments on existing debt
    #[arg(long, default_value = "0")]
    pub existing_debt_payments: Decimal,

    /// Monthly payment on the proposed loan
    #[arg(long, alias = "payment")]
    pub proposed_loan_payment: Option<Decimal>,

    /// Coverage the lender sizes against
    #[arg(long, default_value = "1.25")]
    pub target_dscr: Decimal,
}

/// Arguments for the maximum supportable payment
#[derive(Args)]
pub struct MaxPaymentArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Annual EBITDA
    #[arg(long, alias = "ebitda")]
    pub annual_ebitda: Option<Decimal>,

    /// Annual payments on existing debt
    #[arg(long, default_value = "0")]
    pub existing_debt_payments: Decimal,

    /// Coverage the lender sizes against
    #[arg(long, default_value = "1.25")]
    pub target_dscr: Decimal,
}

/// Arguments for the minimum EBITDA at a target coverage
#[derive(Args)]
pub struct MinEbitdaArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Total annual debt service
    #[arg(long)]
    pub total_debt_payments: Option<Decimal>,

    /// Coverage the lender sizes against
    #[arg(long, default_value = "1.25")]
    pub target_dscr: Decimal,
}

fn default_target() -> Decimal {
    DEFAULT_TARGET_DSCR
}

#[derive(Deserialize)]
struct MaxPaymentInput {
    annual_ebitda: Decimal,
    #[serde(default)]
    existing_debt_payments: Decimal,
    #[serde(default = "default_target")]
    target_dscr: Decimal,
}

#[derive(Deserialize)]
struct MinEbitdaInput {
    total_debt_payments: Decimal,
    #[serde(default = "default_target")]
    target_dscr: Decimal,
}

pub fn run_dscr(args: DscrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cov_input: CoverageInput = match input::structured(args.input.as_deref())? {
        Some(c) => c,
        None => CoverageInput {
            dscr: DscrInput {
                annual_ebitda: args
                    .annual_ebitda
                    .ok_or("--annual-ebitda is required (or provide --input)")?,
                existing_debt_payments: args.existing_debt_payments,
                proposed_loan_payment: args
                    .proposed_loan_payment
                    .ok_or("--proposed-loan-payment is required (or provide --input)")?,
            },
            target_dscr: args.target_dscr,
        },
    };
    let result = coverage::analyze_coverage(&cov_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_max_payment(args: MaxPaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mp = match input::structured::<MaxPaymentInput>(args.input.as_deref())? {
        Some(m) => m,
        None => MaxPaymentInput {
            annual_ebitda: args
                .annual_ebitda
                .ok_or("--annual-ebitda is required (or provide --input)")?,
            existing_debt_payments: args.existing_debt_payments,
            target_dscr: args.target_dscr,
        },
    };
    let max = max_loan_payment(mp.annual_ebitda, mp.existing_debt_payments, mp.target_dscr);
    Ok(json!({
        "max_monthly_payment": max,
        "annual_ebitda": mp.annual_ebitda,
        "existing_debt_payments": mp.existing_debt_payments,
        "target_dscr": mp.target_dscr,
    }))
}

pub fn run_min_ebitda(args: MinEbitdaArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let me = match input::structured::<MinEbitdaInput>(args.input.as_deref())? {
        Some(m) => m,
        None => MinEbitdaInput {
            total_debt_payments: args
                .total_debt_payments
                .ok_or("--total-debt-payments is required (or provide --input)")?,
            target_dscr: args.target_dscr,
        },
    };
    Ok(json!({
        "minimum_ebitda": minimum_ebitda(me.target_dscr, me.total_debt_payments),
        "total_debt_payments": me.total_debt_payments,
        "target_dscr": me.target_dscr,
    }))
}
