use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use sba_calc_core::{amortization, analysis, dscr, fees, monte_carlo};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_payment(input_json: String) -> NapiResult<String> {
    let input: amortization::payment::LoanTerms =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::payment::analyze_payment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn build_amortization_schedule(input_json: String) -> NapiResult<String> {
    let input: amortization::schedule::ScheduleInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        amortization::schedule::build_amortization_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn solve_apr(input_json: String) -> NapiResult<String> {
    let input: amortization::apr::AprInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::apr::solve_apr(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_fixed_vs_variable(input_json: String) -> NapiResult<String> {
    let input: amortization::comparison::RateComparisonInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::comparison::run_rate_comparison(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_fees(input_json: String) -> NapiResult<String> {
    let input: fees::guaranty::FeeInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fees::guaranty::calculate_fees(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct ClosingCostsRequest {
    loan_amount: Decimal,
    #[serde(default)]
    fee_schedule: Option<fees::FeeSchedule>,
}

#[napi]
pub fn estimate_closing_costs(input_json: String) -> NapiResult<String> {
    let req: ClosingCostsRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let estimate = match &req.fee_schedule {
        Some(s) => {
            s.validate().map_err(to_napi_error)?;
            fees::closing_costs::closing_costs_with(s, req.loan_amount)
        }
        None => fees::closing_costs(req.loan_amount),
    };
    serde_json::to_string(&estimate).map_err(to_napi_error)
}

/// The built-in FY 2026 fee table, for display or as a starting point for edits.
#[napi]
pub fn default_fee_schedule() -> NapiResult<String> {
    serde_json::to_string(fees::schedule::default_schedule()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// DSCR
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_coverage(input_json: String) -> NapiResult<String> {
    let input: dscr::coverage::CoverageInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = dscr::coverage::analyze_coverage(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Monte Carlo
// ---------------------------------------------------------------------------

#[napi]
pub fn run_rate_simulation(input_json: String) -> NapiResult<String> {
    let input: monte_carlo::RateRiskInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = monte_carlo::value_at_risk::run_rate_simulation(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_loan(input_json: String) -> NapiResult<String> {
    let input: analysis::LoanAnalysisInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = analysis::analyze_loan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn industry_templates() -> NapiResult<String> {
    serde_json::to_string(analysis::industry_templates()).map_err(to_napi_error)
}
