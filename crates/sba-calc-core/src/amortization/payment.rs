use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::*;
use crate::SbaCalcResult;

pub(crate) const MONTHS_PER_YEAR: Decimal = dec!(12);

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Principal, stated annual rate (percent) and term of a fixed-rate loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub annual_rate: Percent,
    pub term_years: Years,
}

impl LoanTerms {
    pub fn new(principal: Money, annual_rate: Percent, term_years: Years) -> Self {
        Self {
            principal,
            annual_rate,
            term_years,
        }
    }

    /// True when the terms can be amortized: positive principal and term,
    /// non-negative rate.
    pub fn is_valid(&self) -> bool {
        is_amortizable(self.principal, self.annual_rate, self.term_years)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub monthly_payment: Money,
    pub number_of_payments: u32,
    pub total_payments: Money,
    pub total_interest: Money,
    pub total_cost: Money,
}

// ---------------------------------------------------------------------------
// Core formulas
// ---------------------------------------------------------------------------

pub(crate) fn is_amortizable(principal: Money, annual_rate: Percent, term_years: Years) -> bool {
    principal > Decimal::ZERO && annual_rate >= Decimal::ZERO && term_years > Decimal::ZERO
}

/// Monthly periodic rate from an annual percentage.
pub(crate) fn monthly_rate(annual_rate: Percent) -> Decimal {
    annual_rate / dec!(100) / MONTHS_PER_YEAR
}

/// Whole number of monthly payments in a term.
pub fn number_of_payments(term_years: Years) -> u32 {
    if term_years <= Decimal::ZERO {
        return 0;
    }
    (term_years * MONTHS_PER_YEAR).floor().to_u32().unwrap_or(0)
}

/// Level monthly payment: M = P·r·(1+r)^n / ((1+r)^n − 1).
///
/// Returns zero for a non-positive principal or term or a negative rate.
/// A zero rate amortizes linearly (P / n). Rounded to cents.
pub fn monthly_payment(principal: Money, annual_rate: Percent, term_years: Years) -> Money {
    if !is_amortizable(principal, annual_rate, term_years) {
        return Decimal::ZERO;
    }

    let r = monthly_rate(annual_rate);
    let n = term_years * MONTHS_PER_YEAR;

    if r.is_zero() {
        return round_cents(principal / n);
    }

    let growth = match (Decimal::ONE + r).checked_powd(n) {
        Some(g) => g,
        // (1+r)^n beyond Decimal range: the payment converges on interest-only
        None => return round_cents(principal * r),
    };
    let denom = growth - Decimal::ONE;
    if denom.is_zero() {
        return round_cents(principal / n);
    }

    round_cents(principal * r * growth / denom)
}

/// Total interest over the life of the loan: payment × n − principal.
pub fn total_interest(principal: Money, annual_rate: Percent, term_years: Years) -> Money {
    if !is_amortizable(principal, annual_rate, term_years) {
        return Decimal::ZERO;
    }
    let payment = monthly_payment(principal, annual_rate, term_years);
    round_cents(payment * term_years * MONTHS_PER_YEAR - principal)
}

/// Effective rate of a prime-indexed loan.
pub fn variable_rate(prime_rate: Percent, margin: Percent) -> Percent {
    round_cents(prime_rate + margin)
}

/// f64 twin of [`monthly_payment`] used on the simulation hot path, where
/// Decimal exponentiation would dominate run time.
pub fn monthly_payment_f64(principal: f64, annual_rate: f64, term_years: f64) -> f64 {
    if principal <= 0.0 || annual_rate < 0.0 || term_years <= 0.0 {
        return 0.0;
    }

    let r = annual_rate / 100.0 / 12.0;
    let n = term_years * 12.0;

    if r == 0.0 {
        return round_cents_f64(principal / n);
    }

    let growth = (1.0 + r).powf(n);
    if !growth.is_finite() {
        return round_cents_f64(principal * r);
    }

    round_cents_f64(principal * r * growth / (growth - 1.0))
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Payment, total payments and total interest for a set of loan terms.
pub fn analyze_payment(terms: &LoanTerms) -> SbaCalcResult<ComputationOutput<PaymentSummary>> {
    let start = Instant::now();
    let warnings = term_warnings(terms);

    let monthly = monthly_payment(terms.principal, terms.annual_rate, terms.term_years);
    let n = number_of_payments(terms.term_years);
    let interest = total_interest(terms.principal, terms.annual_rate, terms.term_years);
    let total_payments = if terms.is_valid() {
        round_cents(terms.principal + interest)
    } else {
        Decimal::ZERO
    };

    let output = PaymentSummary {
        monthly_payment: monthly,
        number_of_payments: n,
        total_payments,
        total_interest: interest,
        total_cost: total_payments,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-payment amortization (monthly compounding)",
        terms,
        warnings,
        elapsed,
        output,
    ))
}

/// Human-readable notes for terms that fall back to the zero result.
pub(crate) fn term_warnings(terms: &LoanTerms) -> Vec<String> {
    let mut warnings = Vec::new();
    if terms.principal <= Decimal::ZERO {
        warnings.push("Principal is not positive; payment reported as zero".to_string());
    }
    if terms.annual_rate < Decimal::ZERO {
        warnings.push("Annual rate is negative; payment reported as zero".to_string());
    }
    if terms.term_years <= Decimal::ZERO {
        warnings.push("Term is not positive; payment reported as zero".to_string());
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_standard_payment_in_reference_range() {
        let p = monthly_payment(dec!(250000), dec!(7.5), dec!(10));
        assert!(p > dec!(2950) && p < dec!(2970), "payment={p}");
    }

    #[test]
    fn test_twenty_five_year_payment() {
        let p = monthly_payment(dec!(500000), dec!(6.5), dec!(25));
        assert!(p > dec!(3370) && p < dec!(3390), "payment={p}");
    }

    #[test]
    fn test_zero_rate_is_linear() {
        assert_eq!(monthly_payment(dec!(120000), dec!(0), dec!(10)), dec!(1000));
    }

    #[test]
    fn test_invalid_terms_give_zero() {
        assert_eq!(monthly_payment(dec!(0), dec!(7.5), dec!(10)), Decimal::ZERO);
        assert_eq!(monthly_payment(dec!(-1000), dec!(7.5), dec!(10)), Decimal::ZERO);
        assert_eq!(monthly_payment(dec!(250000), dec!(-1), dec!(10)), Decimal::ZERO);
        assert_eq!(monthly_payment(dec!(250000), dec!(7.5), dec!(0)), Decimal::ZERO);
        assert_eq!(total_interest(dec!(0), dec!(7.5), dec!(10)), Decimal::ZERO);
    }

    #[test]
    fn test_short_term_payment() {
        let p = monthly_payment(dec!(120000), dec!(6), dec!(1));
        assert!(p > dec!(10000) && p < dec!(11000), "payment={p}");
    }

    #[test]
    fn test_total_interest_matches_payment_stream() {
        let interest = total_interest(dec!(250000), dec!(7.5), dec!(10));
        let payment = monthly_payment(dec!(250000), dec!(7.5), dec!(10));
        let expected = payment * dec!(120) - dec!(250000);
        assert!((interest - expected).abs() < dec!(0.01));
    }

    #[test]
    fn test_variable_rate_sum() {
        assert_eq!(variable_rate(dec!(5.5), dec!(2.0)), dec!(7.5));
        assert_eq!(variable_rate(dec!(7.504), dec!(2.75)), dec!(10.25));
    }

    #[test]
    fn test_f64_twin_agrees_with_decimal() {
        let d = monthly_payment(dec!(250000), dec!(7.5), dec!(10));
        let f = monthly_payment_f64(250_000.0, 7.5, 10.0);
        assert!((d.to_f64().unwrap() - f).abs() < 0.011, "decimal={d} f64={f}");
        assert_eq!(monthly_payment_f64(120_000.0, 0.0, 10.0), 1000.0);
        assert_eq!(monthly_payment_f64(-1.0, 5.0, 10.0), 0.0);
    }

    #[test]
    fn test_number_of_payments() {
        assert_eq!(number_of_payments(dec!(10)), 120);
        assert_eq!(number_of_payments(dec!(7.5)), 90);
        assert_eq!(number_of_payments(dec!(0)), 0);
        assert_eq!(number_of_payments(dec!(-3)), 0);
    }

    #[test]
    fn test_analyze_payment_envelope() {
        let terms = LoanTerms::new(dec!(120000), dec!(0), dec!(10));
        let out = analyze_payment(&terms).unwrap();
        assert_eq!(out.result.monthly_payment, dec!(1000));
        assert_eq!(out.result.number_of_payments, 120);
        assert_eq!(out.result.total_interest, Decimal::ZERO);
        assert_eq!(out.result.total_payments, dec!(120000));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_analyze_payment_warns_on_invalid_terms() {
        let terms = LoanTerms::new(dec!(0), dec!(7.5), dec!(10));
        let out = analyze_payment(&terms).unwrap();
        assert_eq!(out.result.monthly_payment, Decimal::ZERO);
        assert_eq!(out.result.total_payments, Decimal::ZERO);
        assert_eq!(out.warnings.len(), 1);
    }
}
