pub mod closing_costs;
pub mod guaranty;
pub mod schedule;

pub use closing_costs::{closing_costs, ClosingCostEstimate};
pub use guaranty::{fee_tier_percent, guaranty_fee};
pub use schedule::{FeeSchedule, FeeTier};
