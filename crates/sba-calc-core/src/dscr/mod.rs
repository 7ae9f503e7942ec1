pub mod coverage;

pub use coverage::{
    calculate_dscr, max_loan_payment, minimum_ebitda, DscrInput, DscrResult, EligibilityScore,
    DEFAULT_TARGET_DSCR,
};
