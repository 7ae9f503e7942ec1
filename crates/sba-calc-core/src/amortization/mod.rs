pub mod apr;
pub mod comparison;
pub mod payment;
pub mod schedule;

pub use apr::calculate_apr;
pub use comparison::compare_fixed_vs_variable;
pub use payment::{monthly_payment, total_interest, variable_rate, LoanTerms};
pub use schedule::{amortization_schedule, AmortizationRow};
