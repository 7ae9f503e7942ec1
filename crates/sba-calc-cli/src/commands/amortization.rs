use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use sba_calc_core::amortization::apr::{self, AprInput};
use sba_calc_core::amortization::comparison::{self, RateComparisonInput};
use sba_calc_core::amortization::payment::{self, LoanTerms};
use sba_calc_core::amortization::schedule::{self, ScheduleInput};

use crate::input;

/// Loan terms shared by the amortization commands
#[derive(Args)]
pub struct TermsArgs {
    /// Loan principal
    #[arg(long, alias = "amount")]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (7.5 = 7.5%)
    #[arg(long, alias = "rate")]
    pub annual_rate: Option<Decimal>,

    /// Term in years
    #[arg(long, alias = "term")]
    pub term_years: Option<Decimal>,
}

impl TermsArgs {
    fn to_terms(&self) -> Result<LoanTerms, Box<dyn std::error::Error>> {
        Ok(LoanTerms {
            principal: self
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate: self
                .annual_rate
                .ok_or("--annual-rate is required (or provide --input)")?,
            term_years: self
                .term_years
                .ok_or("--term-years is required (or provide --input)")?,
        })
    }
}

/// Arguments for the monthly payment summary
#[derive(Args)]
pub struct PaymentArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub terms: TermsArgs,
}

/// Arguments for the amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub terms: TermsArgs,

    /// Date of the first payment (YYYY-MM-DD)
    #[arg(long)]
    pub first_payment_date: Option<NaiveDate>,
}

/// Arguments for APR with fees
#[derive(Args)]
pub struct AprArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub terms: TermsArgs,

    /// Guaranty fee financed into the loan
    #[arg(long, default_value = "0")]
    pub guaranty_fee: Decimal,

    /// Closing costs paid at closing
    #[arg(long, default_value = "0")]
    pub closing_costs: Decimal,
}

/// Arguments for fixed vs variable comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long, alias = "amount")]
    pub principal: Option<Decimal>,

    /// Fixed annual rate in percent
    #[arg(long)]
    pub fixed_rate: Option<Decimal>,

    /// Current prime rate in percent
    #[arg(long, alias = "prime")]
    pub prime_rate: Option<Decimal>,

    /// Margin over prime in percent
    #[arg(long)]
    pub margin: Option<Decimal>,

    /// Term in years
    #[arg(long, alias = "term")]
    pub term_years: Option<Decimal>,
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: LoanTerms = match input::structured(args.input.as_deref())? {
        Some(t) => t,
        None => args.terms.to_terms()?,
    };
    let result = payment::analyze_payment(&terms)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: ScheduleInput = match input::structured(args.input.as_deref())? {
        Some(s) => s,
        None => ScheduleInput {
            terms: args.terms.to_terms()?,
            first_payment_date: args.first_payment_date,
        },
    };
    let result = schedule::build_amortization_schedule(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_apr(args: AprArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let apr_input: AprInput = match input::structured(args.input.as_deref())? {
        Some(a) => a,
        None => {
            let terms = args.terms.to_terms()?;
            AprInput {
                principal: terms.principal,
                annual_rate: terms.annual_rate,
                term_years: terms.term_years,
                guaranty_fee: args.guaranty_fee,
                closing_costs: args.closing_costs,
            }
        }
    };
    let result = apr::solve_apr(&apr_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cmp_input: RateComparisonInput = match input::structured(args.input.as_deref())? {
        Some(c) => c,
        None => RateComparisonInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            fixed_rate: args
                .fixed_rate
                .ok_or("--fixed-rate is required (or provide --input)")?,
            prime_rate: args
                .prime_rate
                .ok_or("--prime-rate is required (or provide --input)")?,
            margin: args
                .margin
                .ok_or("--margin is required (or provide --input)")?,
            term_years: args
                .term_years
                .ok_or("--term-years is required (or provide --input)")?,
        },
    };
    let result = comparison::run_rate_comparison(&cmp_input)?;
    Ok(serde_json::to_value(result)?)
}
