pub mod amortization;
pub mod error;
pub mod types;

#[cfg(feature = "fees")]
pub mod fees;

#[cfg(feature = "dscr")]
pub mod dscr;

#[cfg(feature = "monte_carlo")]
pub mod monte_carlo;

#[cfg(feature = "analysis")]
pub mod analysis;

pub use error::SbaCalcError;
pub use types::*;

/// Standard result type for all sba-calc operations
pub type SbaCalcResult<T> = Result<T, SbaCalcError>;
