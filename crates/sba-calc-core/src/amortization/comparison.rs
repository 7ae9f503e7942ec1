use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::payment::{monthly_payment, total_interest, variable_rate};
use crate::types::*;
use crate::SbaCalcResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateComparisonInput {
    pub principal: Money,
    pub fixed_rate: Percent,
    pub prime_rate: Percent,
    pub margin: Percent,
    pub term_years: Years,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateScenario {
    pub rate: Percent,
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub total_cost: Money,
}

/// Fixed minus variable, per field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateDifference {
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub total_cost: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateComparison {
    pub fixed: RateScenario,
    pub variable: RateScenario,
    pub difference: RateDifference,
}

fn scenario(principal: Money, rate: Percent, term_years: Years) -> RateScenario {
    let interest = total_interest(principal, rate, term_years);
    RateScenario {
        rate,
        monthly_payment: monthly_payment(principal, rate, term_years),
        total_interest: interest,
        total_cost: principal + interest,
    }
}

/// Side-by-side fixed and prime-plus-margin scenarios at today's rates.
///
/// When `fixed_rate` equals `prime_rate + margin` both scenarios are identical
/// and every difference is zero.
pub fn compare_fixed_vs_variable(
    principal: Money,
    fixed_rate: Percent,
    prime_rate: Percent,
    margin: Percent,
    term_years: Years,
) -> RateComparison {
    let fixed = scenario(principal, fixed_rate, term_years);
    let variable = scenario(principal, variable_rate(prime_rate, margin), term_years);

    let difference = RateDifference {
        monthly_payment: round_cents(fixed.monthly_payment - variable.monthly_payment),
        total_interest: round_cents(fixed.total_interest - variable.total_interest),
        total_cost: round_cents(fixed.total_cost - variable.total_cost),
    };

    RateComparison {
        fixed,
        variable,
        difference,
    }
}

pub fn run_rate_comparison(
    input: &RateComparisonInput,
) -> SbaCalcResult<ComputationOutput<RateComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let comparison = compare_fixed_vs_variable(
        input.principal,
        input.fixed_rate,
        input.prime_rate,
        input.margin,
        input.term_years,
    );

    if comparison.variable.rate < comparison.fixed.rate {
        warnings.push(
            "Variable rate starts below the fixed rate; future prime moves are not modelled here"
                .to_string(),
        );
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed vs variable (prime + margin held constant)",
        input,
        warnings,
        elapsed,
        comparison,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_identical_when_rates_coincide() {
        let c = compare_fixed_vs_variable(dec!(250000), dec!(7.5), dec!(5.5), dec!(2.0), dec!(10));
        assert_eq!(c.fixed.rate, dec!(7.5));
        assert_eq!(c.variable.rate, dec!(7.5));
        assert_eq!(c.fixed, c.variable);
        assert_eq!(c.difference.monthly_payment, Decimal::ZERO);
        assert_eq!(c.difference.total_interest, Decimal::ZERO);
        assert_eq!(c.difference.total_cost, Decimal::ZERO);
    }

    #[test]
    fn test_cheaper_variable_gives_positive_difference() {
        let c = compare_fixed_vs_variable(dec!(250000), dec!(8.0), dec!(5.0), dec!(2.0), dec!(10));
        assert!(c.difference.monthly_payment > Decimal::ZERO);
        assert!(c.difference.total_cost > Decimal::ZERO);
        assert_eq!(c.fixed.total_cost, dec!(250000) + c.fixed.total_interest);
    }
}
