use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sba_calc_core::fees::{
    closing_costs, fee_tier_percent,
    guaranty::{calculate_fees, guaranty_fee_with, FeeInput},
    guaranty_fee, FeeSchedule, FeeTier,
};
use sba_calc_core::SbaCalcError;

// ===========================================================================
// Guaranty fee (FY 2026)
// ===========================================================================

#[test]
fn test_fee_table() {
    let cases = [
        (dec!(100000), dec!(2000)),
        (dec!(500000), dec!(15000)),
        (dec!(800000), dec!(28000)),
        (dec!(1500000), dec!(53750)),
        (dec!(5000000), dec!(185000)),
        (dec!(0), dec!(0)),
        (dec!(-5000), dec!(0)),
    ];
    for (loan, fee) in cases {
        assert_eq!(guaranty_fee(loan, Decimal::ZERO), fee, "loan={loan}");
    }
}

#[test]
fn test_previous_loans_push_into_higher_tier() {
    assert_eq!(guaranty_fee(dec!(200000), dec!(400000)), dec!(18000));
    assert_eq!(guaranty_fee(dec!(600000), dec!(600000)), dec!(42500));
}

#[test]
fn test_display_percent_is_not_blended() {
    assert_eq!(fee_tier_percent(dec!(1500000)), dec!(3.75));
    let blended = guaranty_fee(dec!(1500000), Decimal::ZERO) / dec!(1500000) * dec!(100);
    assert!(blended < dec!(3.75));
}

// ===========================================================================
// Injected schedules
// ===========================================================================

#[test]
fn test_zero_fee_small_loan_schedule() {
    let mut s = FeeSchedule::fy2026();
    s.guaranty_fees[0] = FeeTier {
        threshold: dec!(150000),
        fee_percent: Decimal::ZERO,
    };
    assert_eq!(guaranty_fee_with(&s, dec!(150000), Decimal::ZERO), Decimal::ZERO);
    assert_eq!(guaranty_fee_with(&s, dec!(150001), Decimal::ZERO), dec!(4500.03));
}

#[test]
fn test_schedule_from_json_file_contents() {
    let json = serde_json::to_string_pretty(&FeeSchedule::fy2026()).unwrap();
    let s = FeeSchedule::from_json_str(&json).unwrap();
    assert_eq!(s.fiscal_year, 2026);
    assert_eq!(s.guaranty_fees.len(), 3);
}

#[test]
fn test_malformed_schedule_is_rejected() {
    let err = FeeSchedule::from_json_str(r#"{"fiscal_year": 2026}"#).unwrap_err();
    assert!(matches!(err, SbaCalcError::SerializationError(_)));
}

// ===========================================================================
// Closing costs and totals
// ===========================================================================

#[test]
fn test_closing_costs_scale_with_loan() {
    assert_eq!(closing_costs(dec!(500000)).total, dec!(16000));
    assert_eq!(closing_costs(dec!(250000)).total, dec!(8000));
    assert_eq!(closing_costs(dec!(2000000)).total, dec!(24000));
}

#[test]
fn test_calculate_fees_totals() {
    let out = calculate_fees(&FeeInput {
        loan_amount: dec!(500000),
        previous_loans_in_90_days: Decimal::ZERO,
        fee_schedule: None,
    })
    .unwrap();
    let r = &out.result;
    assert_eq!(r.fiscal_year, 2026);
    assert_eq!(r.guaranty_fee, dec!(15000));
    assert_eq!(r.tier_percent, dec!(3.0));
    assert_eq!(r.effective_percent, dec!(3));
    assert_eq!(r.total_upfront_costs, dec!(31000));
    assert!(out.warnings.is_empty());
}
