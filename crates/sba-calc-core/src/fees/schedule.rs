use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::SbaCalcError;
use crate::types::*;
use crate::SbaCalcResult;

// ---------------------------------------------------------------------------
// Configuration types
// ---------------------------------------------------------------------------

/// Flat guaranty-fee percentage for aggregate amounts up to `threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeTier {
    pub threshold: Money,
    pub fee_percent: Percent,
}

/// Blended rule above the top flat tier: `base_percent` on the first
/// `threshold` dollars plus `excess_percent` on the remainder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LargeLoanRule {
    pub threshold: Money,
    pub base_percent: Percent,
    pub excess_percent: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRange {
    pub min: Money,
    pub max: Money,
}

impl CostRange {
    pub fn new(min: Money, max: Money) -> Self {
        Self { min, max }
    }

    pub fn midpoint(&self) -> Money {
        (self.min + self.max) / dec!(2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosingCostRanges {
    pub packaging_fee: CostRange,
    pub appraisal_fee: CostRange,
    pub environmental_review: CostRange,
    pub legal_fees: CostRange,
}

/// Closing costs scale with `loan / baseline_loan_amount`, capped at `max_scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosingCostScaling {
    pub baseline_loan_amount: Money,
    pub max_scale: Multiple,
}

/// Guaranty-fee tiers and closing-cost ranges for one fiscal year.
///
/// Loaded as external data so a new fiscal year's table can be dropped in
/// without touching the calculations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub fiscal_year: u16,
    /// Ascending by threshold.
    pub guaranty_fees: Vec<FeeTier>,
    pub large_loan: LargeLoanRule,
    pub closing_costs: ClosingCostRanges,
    pub closing_cost_scaling: ClosingCostScaling,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::fy2026()
    }
}

impl FeeSchedule {
    /// FY 2026 SBA 7(a) table.
    pub fn fy2026() -> Self {
        Self {
            fiscal_year: 2026,
            guaranty_fees: vec![
                FeeTier {
                    threshold: dec!(150000),
                    fee_percent: dec!(2.0),
                },
                FeeTier {
                    threshold: dec!(700000),
                    fee_percent: dec!(3.0),
                },
                FeeTier {
                    threshold: dec!(1000000),
                    fee_percent: dec!(3.5),
                },
            ],
            large_loan: LargeLoanRule {
                threshold: dec!(1000000),
                base_percent: dec!(3.5),
                excess_percent: dec!(3.75),
            },
            closing_costs: ClosingCostRanges {
                packaging_fee: CostRange::new(dec!(2000), dec!(5000)),
                appraisal_fee: CostRange::new(dec!(2000), dec!(10000)),
                environmental_review: CostRange::new(dec!(1500), dec!(5000)),
                legal_fees: CostRange::new(dec!(1500), dec!(5000)),
            },
            closing_cost_scaling: ClosingCostScaling {
                baseline_loan_amount: dec!(500000),
                max_scale: dec!(1.5),
            },
        }
    }

    pub fn from_json_str(s: &str) -> SbaCalcResult<Self> {
        let schedule: FeeSchedule = serde_json::from_str(s)?;
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn from_yaml_str(s: &str) -> SbaCalcResult<Self> {
        let schedule: FeeSchedule = serde_yaml::from_str(s)?;
        schedule.validate()?;
        Ok(schedule)
    }

    /// The tier whose threshold first covers `aggregate`.
    pub fn tier_for(&self, aggregate: Money) -> Option<&FeeTier> {
        self.guaranty_fees.iter().find(|t| aggregate <= t.threshold)
    }

    /// Check the table is usable: at least one tier, strictly ascending
    /// thresholds, non-negative percentages, sane ranges and scaling.
    pub fn validate(&self) -> SbaCalcResult<()> {
        if self.guaranty_fees.is_empty() {
            return Err(SbaCalcError::InvalidFeeSchedule(
                "at least one guaranty fee tier is required".into(),
            ));
        }

        for pair in self.guaranty_fees.windows(2) {
            if pair[1].threshold <= pair[0].threshold {
                return Err(SbaCalcError::InvalidFeeSchedule(format!(
                    "tier thresholds must be ascending ({} then {})",
                    pair[0].threshold, pair[1].threshold
                )));
            }
        }

        let percents = self
            .guaranty_fees
            .iter()
            .map(|t| t.fee_percent)
            .chain([self.large_loan.base_percent, self.large_loan.excess_percent]);
        for p in percents {
            if p < Decimal::ZERO {
                return Err(SbaCalcError::InvalidFeeSchedule(format!(
                    "fee percent {p} is negative"
                )));
            }
        }

        if self.large_loan.threshold <= Decimal::ZERO {
            return Err(SbaCalcError::InvalidFeeSchedule(
                "large loan threshold must be positive".into(),
            ));
        }

        let ranges = [
            ("packaging_fee", &self.closing_costs.packaging_fee),
            ("appraisal_fee", &self.closing_costs.appraisal_fee),
            ("environmental_review", &self.closing_costs.environmental_review),
            ("legal_fees", &self.closing_costs.legal_fees),
        ];
        for (name, range) in ranges {
            if range.min < Decimal::ZERO || range.min > range.max {
                return Err(SbaCalcError::InvalidFeeSchedule(format!(
                    "{name} range must satisfy 0 <= min <= max"
                )));
            }
        }

        if self.closing_cost_scaling.baseline_loan_amount <= Decimal::ZERO
            || self.closing_cost_scaling.max_scale < Decimal::ZERO
        {
            return Err(SbaCalcError::InvalidFeeSchedule(
                "closing cost scaling needs a positive baseline and non-negative cap".into(),
            ));
        }

        Ok(())
    }
}

/// Shared FY 2026 table used by the convenience functions.
pub fn default_schedule() -> &'static FeeSchedule {
    static DEFAULT: OnceLock<FeeSchedule> = OnceLock::new();
    DEFAULT.get_or_init(FeeSchedule::fy2026)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(FeeSchedule::fy2026().validate().is_ok());
        assert_eq!(default_schedule().fiscal_year, 2026);
    }

    #[test]
    fn test_tier_lookup() {
        let s = FeeSchedule::fy2026();
        assert_eq!(s.tier_for(dec!(150000)).unwrap().fee_percent, dec!(2.0));
        assert_eq!(s.tier_for(dec!(150001)).unwrap().fee_percent, dec!(3.0));
        assert_eq!(s.tier_for(dec!(1000000)).unwrap().fee_percent, dec!(3.5));
        assert!(s.tier_for(dec!(1000001)).is_none());
    }

    #[test]
    fn test_rejects_descending_tiers() {
        let mut s = FeeSchedule::fy2026();
        s.guaranty_fees.swap(0, 1);
        assert!(matches!(s.validate(), Err(SbaCalcError::InvalidFeeSchedule(_))));
    }

    #[test]
    fn test_rejects_inverted_range() {
        let mut s = FeeSchedule::fy2026();
        s.closing_costs.legal_fees = CostRange::new(dec!(5000), dec!(1500));
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_json_round_trip_through_loader() {
        let json = serde_json::to_string(&FeeSchedule::fy2026()).unwrap();
        let loaded = FeeSchedule::from_json_str(&json).unwrap();
        assert_eq!(loaded, FeeSchedule::fy2026());
    }

    #[test]
    fn test_yaml_loader_accepts_plain_numbers() {
        let yaml = r#"
fiscal_year: 2027
guaranty_fees:
  - { threshold: 150000, fee_percent: 0 }
  - { threshold: 1000000, fee_percent: 3.5 }
large_loan: { threshold: 1000000, base_percent: 3.5, excess_percent: 3.75 }
closing_costs:
  packaging_fee: { min: 2000, max: 5000 }
  appraisal_fee: { min: 2000, max: 10000 }
  environmental_review: { min: 1500, max: 5000 }
  legal_fees: { min: 1500, max: 5000 }
closing_cost_scaling: { baseline_loan_amount: 500000, max_scale: 1.5 }
"#;
        let s = FeeSchedule::from_yaml_str(yaml).unwrap();
        assert_eq!(s.fiscal_year, 2027);
        assert_eq!(s.guaranty_fees.len(), 2);
        assert_eq!(s.guaranty_fees[0].fee_percent, Decimal::ZERO);
        assert_eq!(s.large_loan.excess_percent, dec!(3.75));
    }

    #[test]
    fn test_midpoint() {
        assert_eq!(CostRange::new(dec!(2000), dec!(5000)).midpoint(), dec!(3500));
    }
}
