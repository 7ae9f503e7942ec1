use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::types::*;
use crate::SbaCalcResult;

/// Coverage most SBA lenders size against.
pub const DEFAULT_TARGET_DSCR: Multiple = dec!(1.25);

const EXCELLENT_DSCR: Multiple = dec!(1.50);
const GOOD_DSCR: Multiple = dec!(1.25);
const FAIR_DSCR: Multiple = dec!(1.15);

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DscrInput {
    pub annual_ebitda: Money,
    /// Annual debt service on existing obligations.
    pub existing_debt_payments: Money,
    /// Monthly payment on the proposed loan.
    pub proposed_loan_payment: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EligibilityScore {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl EligibilityScore {
    /// Band for a (rounded) coverage ratio, evaluated top-down.
    pub fn from_dscr(dscr: Multiple) -> Self {
        if dscr >= EXCELLENT_DSCR {
            EligibilityScore::Excellent
        } else if dscr >= GOOD_DSCR {
            EligibilityScore::Good
        } else if dscr >= FAIR_DSCR {
            EligibilityScore::Fair
        } else {
            EligibilityScore::Poor
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            EligibilityScore::Excellent => {
                "Strong position. Cash flow comfortably covers all debt obligations and lenders will view this favorably."
            }
            EligibilityScore::Good => {
                "Good position. Cash flow covers debt payments with a reasonable cushion; approval is likely."
            }
            EligibilityScore::Fair => {
                "Marginal position. Minimum requirements are met with little room for error; consider strengthening cash flow or reducing debt."
            }
            EligibilityScore::Poor => {
                "Below lender thresholds. Increase revenue, reduce expenses, or pay down existing debt before applying."
            }
        }
    }
}

impl fmt::Display for EligibilityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EligibilityScore::Excellent => "excellent",
            EligibilityScore::Good => "good",
            EligibilityScore::Fair => "fair",
            EligibilityScore::Poor => "poor",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DscrResult {
    pub dscr: Multiple,
    pub score: EligibilityScore,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageInput {
    #[serde(flatten)]
    pub dscr: DscrInput,
    #[serde(default = "default_target_dscr")]
    pub target_dscr: Multiple,
}

fn default_target_dscr() -> Multiple {
    DEFAULT_TARGET_DSCR
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageOutput {
    pub dscr: Multiple,
    pub score: EligibilityScore,
    pub recommendation: String,
    /// Existing plus annualised proposed payments.
    pub total_debt_service: Money,
    pub target_dscr: Multiple,
    /// EBITDA needed to hit the target at the current debt service.
    pub minimum_ebitda: Money,
    /// Largest monthly payment the target coverage supports.
    pub max_monthly_payment: Money,
    /// Max supportable payment minus the proposed payment (negative when short).
    pub payment_headroom: Money,
}

// ---------------------------------------------------------------------------
// Core
// ---------------------------------------------------------------------------

fn total_debt_service(input: &DscrInput) -> Money {
    input.existing_debt_payments + input.proposed_loan_payment * dec!(12)
}

/// Coverage ratio and eligibility band.
///
/// A non-positive total debt service yields a ratio of zero (scored poor)
/// rather than dividing by zero.
pub fn calculate_dscr(input: &DscrInput) -> DscrResult {
    let total = total_debt_service(input);
    let dscr = if total > Decimal::ZERO {
        round_cents(input.annual_ebitda / total)
    } else {
        Decimal::ZERO
    };

    let score = EligibilityScore::from_dscr(dscr);
    DscrResult {
        dscr,
        score,
        recommendation: score.recommendation().to_string(),
    }
}

/// EBITDA required to reach `target_dscr`, to the whole dollar.
pub fn minimum_ebitda(target_dscr: Multiple, total_debt_payments: Money) -> Money {
    round_whole(total_debt_payments * target_dscr)
}

/// Largest monthly payment a business can carry at `target_dscr`, never negative.
pub fn max_loan_payment(
    annual_ebitda: Money,
    existing_debt_payments: Money,
    target_dscr: Multiple,
) -> Money {
    if target_dscr <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let available_cash_flow = annual_ebitda / target_dscr;
    let max_annual_debt_service = available_cash_flow - existing_debt_payments;
    round_cents(max_annual_debt_service / dec!(12)).max(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn analyze_coverage(input: &CoverageInput) -> SbaCalcResult<ComputationOutput<CoverageOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let total = total_debt_service(&input.dscr);
    if total <= Decimal::ZERO {
        warnings.push("No debt service supplied; DSCR reported as zero".to_string());
    }
    if input.target_dscr <= Decimal::ZERO {
        warnings.push("Target DSCR is not positive; max payment reported as zero".to_string());
    }

    let result = calculate_dscr(&input.dscr);
    let max_monthly = max_loan_payment(
        input.dscr.annual_ebitda,
        input.dscr.existing_debt_payments,
        input.target_dscr,
    );

    let output = CoverageOutput {
        dscr: result.dscr,
        score: result.score,
        recommendation: result.recommendation,
        total_debt_service: total,
        target_dscr: input.target_dscr,
        minimum_ebitda: minimum_ebitda(input.target_dscr, total),
        max_monthly_payment: max_monthly,
        payment_headroom: max_monthly - input.dscr.proposed_loan_payment,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Debt service coverage (EBITDA / annual debt service)",
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

    fn input(ebitda: Decimal, existing: Decimal, proposed: Decimal) -> DscrInput {
        DscrInput {
            annual_ebitda: ebitda,
            existing_debt_payments: existing,
            proposed_loan_payment: proposed,
        }
    }

    #[test]
    fn test_dscr_basic() {
        // 150,000 / (40,000 + 36,000) = 1.97
        let r = calculate_dscr(&input(dec!(150000), dec!(40000), dec!(3000)));
        assert_eq!(r.dscr, dec!(1.97));
        assert_eq!(r.score, EligibilityScore::Excellent);
    }

    #[test]
    fn test_score_bands() {
        let cases = [
            (dec!(8000), dec!(1.56), EligibilityScore::Excellent),
            (dec!(9500), dec!(1.32), EligibilityScore::Good),
            (dec!(10700), dec!(1.17), EligibilityScore::Fair),
            (dec!(11000), dec!(1.14), EligibilityScore::Poor),
        ];
        for (payment, ratio, score) in cases {
            let r = calculate_dscr(&input(dec!(150000), dec!(0), payment));
            assert_eq!(r.dscr, ratio, "payment={payment}");
            assert_eq!(r.score, score, "payment={payment}");
        }
    }

    #[test]
    fn test_exact_band_edges() {
        assert_eq!(EligibilityScore::from_dscr(dec!(1.50)), EligibilityScore::Excellent);
        assert_eq!(EligibilityScore::from_dscr(dec!(1.49)), EligibilityScore::Good);
        assert_eq!(EligibilityScore::from_dscr(dec!(1.25)), EligibilityScore::Good);
        assert_eq!(EligibilityScore::from_dscr(dec!(1.24)), EligibilityScore::Fair);
        assert_eq!(EligibilityScore::from_dscr(dec!(1.15)), EligibilityScore::Fair);
        assert_eq!(EligibilityScore::from_dscr(dec!(1.14)), EligibilityScore::Poor);
    }

    #[test]
    fn test_zero_debt_service() {
        let r = calculate_dscr(&input(dec!(150000), dec!(0), dec!(0)));
        assert_eq!(r.dscr, Decimal::ZERO);
        assert_eq!(r.score, EligibilityScore::Poor);
    }

    #[test]
    fn test_minimum_ebitda() {
        assert_eq!(minimum_ebitda(dec!(1.25), dec!(100000)), dec!(125000));
        assert_eq!(minimum_ebitda(dec!(1.15), dec!(33333)), dec!(38333));
    }

    #[test]
    fn test_max_loan_payment() {
        // 150,000 / 1.25 = 120,000; less 40,000 = 80,000 / 12
        assert_eq!(max_loan_payment(dec!(150000), dec!(40000), dec!(1.25)), dec!(6666.67));
    }

    #[test]
    fn test_max_loan_payment_clamps_to_zero() {
        assert_eq!(max_loan_payment(dec!(50000), dec!(90000), dec!(1.25)), Decimal::ZERO);
        assert_eq!(max_loan_payment(dec!(50000), dec!(0), dec!(0)), Decimal::ZERO);
    }

    #[test]
    fn test_score_serializes_lowercase() {
        let json = serde_json::to_string(&EligibilityScore::Excellent).unwrap();
        assert_eq!(json, "\"excellent\"");
        assert_eq!(EligibilityScore::Fair.to_string(), "fair");
    }

    #[test]
    fn test_analyze_coverage_headroom() {
        let out = analyze_coverage(&CoverageInput {
            dscr: input(dec!(150000), dec!(40000), dec!(3000)),
            target_dscr: DEFAULT_TARGET_DSCR,
        })
        .unwrap();
        let r = &out.result;
        assert_eq!(r.total_debt_service, dec!(76000));
        assert_eq!(r.minimum_ebitda, dec!(95000));
        assert_eq!(r.max_monthly_payment, dec!(6666.67));
        assert_eq!(r.payment_headroom, dec!(3666.67));
        assert!(out.warnings.is_empty());
    }
}
