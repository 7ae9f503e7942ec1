use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sba_calc_core::amortization::{
    apr::{solve_apr, AprInput},
    calculate_apr, compare_fixed_vs_variable,
    comparison::{run_rate_comparison, RateComparisonInput},
    monthly_payment,
    payment::analyze_payment,
    schedule::{build_amortization_schedule, ScheduleInput},
    amortization_schedule, total_interest, LoanTerms,
};

// ===========================================================================
// Monthly payment
// ===========================================================================

#[test]
fn test_reference_payments() {
    assert_eq!(monthly_payment(dec!(250000), dec!(7.5), dec!(10)), dec!(2967.54));
    assert_eq!(monthly_payment(dec!(500000), dec!(6.5), dec!(25)), dec!(3376.04));
    assert_eq!(monthly_payment(dec!(120000), dec!(0), dec!(10)), dec!(1000));
}

#[test]
fn test_invalid_terms_pay_nothing() {
    assert_eq!(monthly_payment(dec!(0), dec!(7.5), dec!(10)), Decimal::ZERO);
    assert_eq!(monthly_payment(dec!(100000), dec!(-1), dec!(10)), Decimal::ZERO);
    assert_eq!(monthly_payment(dec!(100000), dec!(7.5), dec!(0)), Decimal::ZERO);
    assert_eq!(total_interest(dec!(-1), dec!(7.5), dec!(10)), Decimal::ZERO);
}

#[test]
fn test_payment_summary_envelope() {
    let out = analyze_payment(&LoanTerms::new(dec!(250000), dec!(7.5), dec!(10))).unwrap();
    let s = &out.result;
    assert_eq!(s.number_of_payments, 120);
    assert_eq!(s.total_payments, dec!(250000) + s.total_interest);
    assert!(out.warnings.is_empty());
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
}

// ===========================================================================
// Schedule
// ===========================================================================

#[test]
fn test_schedule_shape_and_final_balance() {
    let rows = amortization_schedule(dec!(250000), dec!(7.5), dec!(10));
    assert_eq!(rows.len(), 120);
    assert_eq!(rows.last().unwrap().balance, Decimal::ZERO);
    for pair in rows.windows(2) {
        assert!(pair[1].balance <= pair[0].balance);
    }
    for row in &rows {
        assert!((row.payment - row.principal - row.interest).abs() <= dec!(0.01));
    }
}

#[test]
fn test_schedule_interest_matches_total_interest() {
    let rows = amortization_schedule(dec!(250000), dec!(7.5), dec!(10));
    let sum: Decimal = rows.iter().map(|r| r.interest).sum();
    let expected = total_interest(dec!(250000), dec!(7.5), dec!(10));
    assert!((sum - expected).abs() < dec!(1), "sum={sum} expected={expected}");
}

#[test]
fn test_dated_schedule_clamps_month_end() {
    let input = ScheduleInput {
        terms: LoanTerms::new(dec!(12000), dec!(6), dec!(1)),
        first_payment_date: NaiveDate::from_ymd_opt(2026, 1, 31),
    };
    let out = build_amortization_schedule(&input).unwrap();
    let rows = &out.result.rows;
    assert_eq!(rows.len(), 12);
    assert_eq!(rows[0].payment_date, NaiveDate::from_ymd_opt(2026, 1, 31));
    assert_eq!(rows[1].payment_date, NaiveDate::from_ymd_opt(2026, 2, 28));
    assert_eq!(rows[11].payment_date, NaiveDate::from_ymd_opt(2026, 12, 31));
}

// ===========================================================================
// APR
// ===========================================================================

#[test]
fn test_apr_with_sba_fees() {
    let apr = calculate_apr(dec!(250000), dec!(7.5), dec!(10), dec!(7500), dec!(10000));
    assert_eq!(apr, dec!(9.13));
}

#[test]
fn test_apr_without_fees_is_stated_rate() {
    let apr = calculate_apr(dec!(250000), dec!(7.5), dec!(10), dec!(0), dec!(0));
    assert_eq!(apr, dec!(7.5));
}

#[test]
fn test_apr_closing_costs_consume_proceeds() {
    let out = solve_apr(&AprInput {
        principal: dec!(10000),
        annual_rate: dec!(7.5),
        term_years: dec!(5),
        guaranty_fee: dec!(0),
        closing_costs: dec!(12000),
    })
    .unwrap();
    assert_eq!(out.result.apr, Decimal::ZERO);
    assert!(!out.warnings.is_empty());
}

// ===========================================================================
// Fixed vs variable
// ===========================================================================

#[test]
fn test_identical_rates_have_no_difference() {
    let c = compare_fixed_vs_variable(dec!(300000), dec!(10.25), dec!(7.5), dec!(2.75), dec!(10));
    assert_eq!(c.fixed, c.variable);
    assert_eq!(c.difference.monthly_payment, Decimal::ZERO);
    assert_eq!(c.difference.total_interest, Decimal::ZERO);
    assert_eq!(c.difference.total_cost, Decimal::ZERO);
}

#[test]
fn test_cheaper_variable_rate_warns() {
    let out = run_rate_comparison(&RateComparisonInput {
        principal: dec!(300000),
        fixed_rate: dec!(10.5),
        prime_rate: dec!(7.5),
        margin: dec!(2.25),
        term_years: dec!(10),
    })
    .unwrap();
    assert!(out.result.difference.monthly_payment > Decimal::ZERO);
    assert_eq!(out.warnings.len(), 1);
}
