use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::templates::IndustryTemplate;
use crate::amortization::apr::calculate_apr;
use crate::amortization::payment::{self, monthly_payment, total_interest, variable_rate, LoanTerms};
use crate::amortization::schedule::{amortization_schedule, AmortizationRow};
use crate::dscr::{calculate_dscr, DscrInput, EligibilityScore};
use crate::error::SbaCalcError;
use crate::fees::closing_costs::{closing_costs_with, ClosingCostEstimate};
use crate::fees::guaranty::guaranty_fee_with;
use crate::fees::schedule::{default_schedule, FeeSchedule};
use crate::types::*;
use crate::SbaCalcResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanAnalysisInput {
    pub amount: Money,
    pub term_years: Years,
    /// Stated rate, ignored when `is_variable_rate` is set.
    pub interest_rate: Percent,
    #[serde(default)]
    pub is_variable_rate: bool,
    #[serde(default)]
    pub prime_rate: Option<Percent>,
    #[serde(default)]
    pub margin: Option<Percent>,
    /// Coverage is only reported when EBITDA is known.
    #[serde(default)]
    pub annual_ebitda: Option<Money>,
    #[serde(default)]
    pub existing_debt_payments: Money,
    #[serde(default)]
    pub previous_loans_in_90_days: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_schedule: Option<FeeSchedule>,
}

impl LoanAnalysisInput {
    /// Fixed-rate analysis prefilled from an industry preset.
    pub fn from_template(template: &IndustryTemplate) -> Self {
        Self {
            amount: template.average_loan_amount,
            term_years: template.typical_term,
            interest_rate: template.average_rate,
            is_variable_rate: false,
            prime_rate: None,
            margin: None,
            annual_ebitda: Some(template.typical_ebitda),
            existing_debt_payments: template.existing_debt,
            previous_loans_in_90_days: Decimal::ZERO,
            fee_schedule: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanAnalysis {
    /// Rate actually used: stated, or prime plus margin.
    pub interest_rate: Percent,
    pub monthly_payment: Money,
    pub total_payments: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    pub guaranty_fee: Money,
    pub closing_costs: ClosingCostEstimate,
    /// Principal, interest, guaranty fee and closing costs together.
    pub total_cost_of_borrowing: Money,
    pub effective_apr: Percent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dscr: Option<Multiple>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligibility_score: Option<EligibilityScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    pub amortization_schedule: Vec<AmortizationRow>,
}

// ---------------------------------------------------------------------------
// Core
// ---------------------------------------------------------------------------

fn applied_rate(input: &LoanAnalysisInput) -> SbaCalcResult<Percent> {
    if !input.is_variable_rate {
        return Ok(input.interest_rate);
    }
    let prime = input.prime_rate.ok_or_else(|| SbaCalcError::InvalidInput {
        field: "prime_rate".into(),
        reason: "Required for a variable-rate loan".into(),
    })?;
    Ok(variable_rate(prime, input.margin.unwrap_or(Decimal::ZERO)))
}

/// Every figure the calculator shows for one loan, computed in a single pass.
pub fn analyze_loan(input: &LoanAnalysisInput) -> SbaCalcResult<ComputationOutput<LoanAnalysis>> {
    let start = Instant::now();

    let schedule = match &input.fee_schedule {
        Some(s) => {
            s.validate()?;
            s
        }
        None => default_schedule(),
    };

    let rate = applied_rate(input)?;
    let terms = LoanTerms::new(input.amount, rate, input.term_years);
    let mut warnings = payment::term_warnings(&terms);

    let monthly = monthly_payment(input.amount, rate, input.term_years);
    let interest = total_interest(input.amount, rate, input.term_years);
    let total_principal = if terms.is_valid() {
        input.amount
    } else {
        Decimal::ZERO
    };
    let total_payments = total_principal + interest;

    let fee = guaranty_fee_with(schedule, input.amount, input.previous_loans_in_90_days);
    let closing = closing_costs_with(schedule, input.amount);
    let apr = calculate_apr(input.amount, rate, input.term_years, fee, closing.total);

    let coverage = input.annual_ebitda.map(|ebitda| {
        calculate_dscr(&DscrInput {
            annual_ebitda: ebitda,
            existing_debt_payments: input.existing_debt_payments,
            proposed_loan_payment: monthly,
        })
    });
    if let Some(c) = &coverage {
        if c.score == EligibilityScore::Poor {
            warnings.push(format!("DSCR {} is below typical lender minimums", c.dscr));
        }
    }
    if input.is_variable_rate {
        warnings.push(
            "Variable rate held at today's prime plus margin; see monte-carlo for rate risk"
                .to_string(),
        );
    }

    let rows = amortization_schedule(input.amount, rate, input.term_years);

    let output = LoanAnalysis {
        interest_rate: rate,
        monthly_payment: monthly,
        total_payments,
        total_interest: interest,
        total_principal,
        guaranty_fee: fee,
        closing_costs: closing.clone(),
        total_cost_of_borrowing: total_payments + fee + closing.total,
        effective_apr: apr,
        dscr: coverage.as_ref().map(|c| c.dscr),
        eligibility_score: coverage.as_ref().map(|c| c.score),
        recommendation: coverage.map(|c| c.recommendation),
        amortization_schedule: rows,
    };

    tracing::debug!(
        amount = %input.amount,
        rate = %rate,
        apr = %apr,
        "loan analysis complete"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "SBA 7(a) loan analysis: amortization, guaranty fee, closing costs, APR and DSCR",
        input,
        warnings,
        elapsed,
        output,
    ))
}
