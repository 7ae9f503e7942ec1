pub mod simulation;
pub mod value_at_risk;

pub use simulation::{
    run_monte_carlo_simulation, run_monte_carlo_simulation_with_cancel, McPercentiles, McStats,
    MonteCarloResult, RateSimulationInput,
};
pub use value_at_risk::{calculate_value_at_risk, RateRiskInput, RateRiskOutput};
