pub mod amortization;
pub mod analysis;
pub mod dscr;
pub mod fees;
pub mod monte_carlo;
