use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use sba_calc_core::analysis::{self, LoanAnalysisInput};
use sba_calc_core::fees::FeeSchedule;

use crate::input;

/// Arguments for the full loan analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Start from an industry template (see `sbacalc templates`)
    #[arg(long)]
    pub template: Option<String>,

    /// Loan amount
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Term in years
    #[arg(long, alias = "term")]
    pub term_years: Option<Decimal>,

    /// Stated annual rate in percent
    #[arg(long, alias = "rate")]
    pub interest_rate: Option<Decimal>,

    /// Price the loan at prime plus margin instead of the stated rate
    #[arg(long)]
    pub variable: bool,

    /// Current prime rate in percent
    #[arg(long, alias = "prime")]
    pub prime_rate: Option<Decimal>,

    /// Margin over prime in percent
    #[arg(long)]
    pub margin: Option<Decimal>,

    /// Annual EBITDA, enables DSCR
    #[arg(long, alias = "ebitda")]
    pub annual_ebitda: Option<Decimal>,

    /// Annual payments on existing debt
    #[arg(long)]
    pub existing_debt_payments: Option<Decimal>,

    /// Other 7(a) loans to the same borrower in the last 90 days
    #[arg(long)]
    pub previous_loans: Option<Decimal>,
}

/// Arguments for listing industry templates
#[derive(Args)]
pub struct TemplatesArgs {
    /// Show a single template by id
    #[arg(long)]
    pub id: Option<String>,
}

fn from_flags(args: &AnalyzeArgs) -> Result<LoanAnalysisInput, Box<dyn std::error::Error>> {
    let mut base = match args.template.as_deref() {
        Some(id) => {
            let t = analysis::find_template(id)
                .ok_or_else(|| format!("Unknown template '{}'", id))?;
            LoanAnalysisInput::from_template(t)
        }
        None => LoanAnalysisInput {
            amount: args
                .amount
                .ok_or("--amount is required (or provide --input or --template)")?,
            term_years: args
                .term_years
                .ok_or("--term-years is required (or provide --input or --template)")?,
            interest_rate: args
                .interest_rate
                .ok_or("--interest-rate is required (or provide --input or --template)")?,
            is_variable_rate: false,
            prime_rate: None,
            margin: None,
            annual_ebitda: None,
            existing_debt_payments: Decimal::ZERO,
            previous_loans_in_90_days: Decimal::ZERO,
            fee_schedule: None,
        },
    };

    // Explicit flags override template values
    if let Some(v) = args.amount {
        base.amount = v;
    }
    if let Some(v) = args.term_years {
        base.term_years = v;
    }
    if let Some(v) = args.interest_rate {
        base.interest_rate = v;
    }
    if args.variable {
        base.is_variable_rate = true;
    }
    if args.prime_rate.is_some() {
        base.prime_rate = args.prime_rate;
    }
    if args.margin.is_some() {
        base.margin = args.margin;
    }
    if args.annual_ebitda.is_some() {
        base.annual_ebitda = args.annual_ebitda;
    }
    if let Some(v) = args.existing_debt_payments {
        base.existing_debt_payments = v;
    }
    if let Some(v) = args.previous_loans {
        base.previous_loans_in_90_days = v;
    }
    Ok(base)
}

pub fn run_analyze(
    args: AnalyzeArgs,
    fee_schedule: Option<&FeeSchedule>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut loan: LoanAnalysisInput = match input::structured(args.input.as_deref())? {
        Some(l) => l,
        None => from_flags(&args)?,
    };
    if loan.fee_schedule.is_none() {
        loan.fee_schedule = fee_schedule.cloned();
    }
    let result = analysis::analyze_loan(&loan)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_templates(args: TemplatesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    match args.id.as_deref() {
        Some(id) => {
            let t = analysis::find_template(id)
                .ok_or_else(|| format!("Unknown template '{}'", id))?;
            Ok(serde_json::to_value(t)?)
        }
        None => Ok(serde_json::to_value(analysis::industry_templates())?),
    }
}
