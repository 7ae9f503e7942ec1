use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::payment::{self, LoanTerms};
use crate::types::*;
use crate::SbaCalcResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// One month of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub month: u32,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    pub balance: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    #[serde(flatten)]
    pub terms: LoanTerms,
    /// Date of the first payment; later rows fall on the same day of
    /// subsequent months.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_payment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutput {
    pub monthly_payment: Money,
    pub total_principal: Money,
    pub total_interest: Money,
    pub rows: Vec<AmortizationRow>,
}

// ---------------------------------------------------------------------------
// Core
// ---------------------------------------------------------------------------

/// Month-by-month breakdown of a level-payment loan.
///
/// Produces exactly `term_years × 12` rows. The final row's balance is forced
/// to zero so accumulated rounding drift never leaves a stray balance, and
/// every balance is clamped at zero. Invalid terms yield an empty schedule.
pub fn amortization_schedule(
    principal: Money,
    annual_rate: Percent,
    term_years: Years,
) -> Vec<AmortizationRow> {
    if !payment::is_amortizable(principal, annual_rate, term_years) {
        return Vec::new();
    }

    let monthly_payment = payment::monthly_payment(principal, annual_rate, term_years);
    let r = payment::monthly_rate(annual_rate);
    let n = payment::number_of_payments(term_years);

    let mut rows = Vec::with_capacity(n as usize);
    let mut balance = principal;

    for month in 1..=n {
        let interest = balance * r;
        let principal_paid = monthly_payment - interest;
        balance -= principal_paid;

        if month == n {
            balance = Decimal::ZERO;
        }

        rows.push(AmortizationRow {
            month,
            payment: monthly_payment,
            principal: round_cents(principal_paid),
            interest: round_cents(interest),
            balance: round_cents(balance).max(Decimal::ZERO),
            payment_date: None,
        });
    }

    rows
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build a schedule, optionally dated from the first payment date.
pub fn build_amortization_schedule(
    input: &ScheduleInput,
) -> SbaCalcResult<ComputationOutput<ScheduleOutput>> {
    let start = Instant::now();
    let mut warnings = payment::term_warnings(&input.terms);

    let terms = &input.terms;
    let mut rows = amortization_schedule(terms.principal, terms.annual_rate, terms.term_years);

    if let Some(first) = input.first_payment_date {
        for row in rows.iter_mut() {
            row.payment_date = first.checked_add_months(Months::new(row.month - 1));
        }
        if rows.iter().any(|r| r.payment_date.is_none()) {
            warnings.push("Some payment dates fall outside the supported calendar range".into());
        }
    }

    let total_principal = round_cents(rows.iter().map(|r| r.principal).sum::<Decimal>());
    let total_interest = round_cents(rows.iter().map(|r| r.interest).sum::<Decimal>());

    let output = ScheduleOutput {
        monthly_payment: payment::monthly_payment(
            terms.principal,
            terms.annual_rate,
            terms.term_years,
        ),
        total_principal,
        total_interest,
        rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Amortization schedule (final-row balance correction)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_schedule_length() {
        let schedule = amortization_schedule(dec!(250000), dec!(7.5), dec!(10));
        assert_eq!(schedule.len(), 120);
        assert_eq!(schedule[0].month, 1);
        assert_eq!(schedule[119].month, 120);
    }

    #[test]
    fn test_final_balance_is_zero() {
        let schedule = amortization_schedule(dec!(250000), dec!(7.5), dec!(10));
        assert_eq!(schedule.last().unwrap().balance, Decimal::ZERO);
    }

    #[test]
    fn test_balance_non_increasing() {
        let schedule = amortization_schedule(dec!(500000), dec!(6.5), dec!(25));
        assert_eq!(schedule.len(), 300);
        for pair in schedule.windows(2) {
            assert!(pair[1].balance <= pair[0].balance, "month {}", pair[1].month);
        }
        assert!(schedule.iter().all(|r| r.balance >= Decimal::ZERO));
    }

    #[test]
    fn test_payment_splits_into_principal_and_interest() {
        let schedule = amortization_schedule(dec!(250000), dec!(7.5), dec!(10));
        for row in &schedule {
            let diff = (row.payment - (row.principal + row.interest)).abs();
            assert!(diff <= dec!(0.01), "month {} diff {}", row.month, diff);
        }
    }

    #[test]
    fn test_first_month_interest() {
        let schedule = amortization_schedule(dec!(250000), dec!(7.5), dec!(10));
        // 250,000 × 0.075 / 12
        assert_eq!(schedule[0].interest, dec!(1562.50));
    }

    #[test]
    fn test_zero_rate_schedule() {
        let schedule = amortization_schedule(dec!(120000), dec!(0), dec!(10));
        assert_eq!(schedule.len(), 120);
        assert!(schedule.iter().all(|r| r.interest.is_zero()));
        assert_eq!(schedule[0].balance, dec!(119000));
        assert_eq!(schedule[119].balance, Decimal::ZERO);
    }

    #[test]
    fn test_invalid_terms_empty_schedule() {
        assert!(amortization_schedule(dec!(0), dec!(7.5), dec!(10)).is_empty());
        assert!(amortization_schedule(dec!(1000), dec!(7.5), dec!(0)).is_empty());
    }

    #[test]
    fn test_dated_schedule() {
        let input = ScheduleInput {
            terms: LoanTerms::new(dec!(100000), dec!(8), dec!(1)),
            first_payment_date: NaiveDate::from_ymd_opt(2026, 1, 31),
        };
        let out = build_amortization_schedule(&input).unwrap();
        let rows = &out.result.rows;
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].payment_date, NaiveDate::from_ymd_opt(2026, 1, 31));
        // Month-end dates clamp to the shorter month
        assert_eq!(rows[1].payment_date, NaiveDate::from_ymd_opt(2026, 2, 28));
        assert_eq!(rows[11].payment_date, NaiveDate::from_ymd_opt(2026, 12, 31));
    }

    #[test]
    fn test_schedule_totals() {
        let input = ScheduleInput {
            terms: LoanTerms::new(dec!(250000), dec!(7.5), dec!(10)),
            first_payment_date: None,
        };
        let out = build_amortization_schedule(&input).unwrap();
        let principal_gap = (out.result.total_principal - dec!(250000)).abs();
        assert!(principal_gap < dec!(1), "gap={principal_gap}");
        assert!(out.result.rows.iter().all(|r| r.payment_date.is_none()));
    }
}
