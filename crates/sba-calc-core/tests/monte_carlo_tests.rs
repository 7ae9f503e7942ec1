use pretty_assertions::assert_eq;
use sba_calc_core::monte_carlo::{
    calculate_value_at_risk, run_monte_carlo_simulation, value_at_risk::run_rate_simulation,
    RateRiskInput, RateSimulationInput,
};
use sba_calc_core::SbaCalcError;

fn variable_loan(scenarios: u32, seed: u64) -> RateSimulationInput {
    RateSimulationInput {
        scenarios,
        seed: Some(seed),
        ..RateSimulationInput::new(500_000.0, 7.5, 2.75, 10.0)
    }
}

#[test]
fn test_total_cost_ordering() {
    let r = run_monte_carlo_simulation(&variable_loan(1000, 11)).unwrap();
    let costs = [
        r.best_case.total_cost,
        r.percentiles.p10.total_cost,
        r.percentiles.p25.total_cost,
        r.percentiles.p50.total_cost,
        r.percentiles.p75.total_cost,
        r.percentiles.p90.total_cost,
        r.worst_case.total_cost,
    ];
    for pair in costs.windows(2) {
        assert!(pair[0] <= pair[1], "{costs:?}");
    }
    assert!(r.best_case.total_cost <= r.expected.total_cost);
    assert!(r.expected.total_cost <= r.worst_case.total_cost);
}

#[test]
fn test_reports_inputs() {
    let r = run_monte_carlo_simulation(&variable_loan(100, 1)).unwrap();
    assert_eq!(r.scenarios, 100);
    assert_eq!(r.time_horizon_years, 10.0);
    assert_eq!(r.current_rate, 10.25);
}

#[test]
fn test_seeded_runs_repeat() {
    let single = run_monte_carlo_simulation(&variable_loan(300, 99)).unwrap();
    let again = run_monte_carlo_simulation(&variable_loan(300, 99)).unwrap();
    assert_eq!(single.percentiles.p90, again.percentiles.p90);

    let threaded = RateSimulationInput {
        workers: Some(3),
        ..variable_loan(300, 99)
    };
    let t1 = run_monte_carlo_simulation(&threaded).unwrap();
    let t2 = run_monte_carlo_simulation(&threaded).unwrap();
    assert_eq!(t1.expected, t2.expected);
}

#[test]
fn test_rate_reversion_lowers_costs_from_high_prime() {
    // Prime well above its long-run mean drifts down, so expected payments
    // fall below the opening payment.
    let input = RateSimulationInput {
        scenarios: 200,
        seed: Some(5),
        volatility: 0.5,
        ..RateSimulationInput::new(300_000.0, 9.0, 2.0, 15.0)
    };
    let r = run_monte_carlo_simulation(&input).unwrap();
    assert!(r.expected.min_payment < r.expected.max_payment);
    assert!(r.expected.avg_payment < r.expected.max_payment);
}

#[test]
fn test_zero_scenarios_is_an_error() {
    let err = run_monte_carlo_simulation(&variable_loan(0, 1)).unwrap_err();
    assert!(matches!(err, SbaCalcError::InvalidInput { .. }));
}

#[test]
fn test_value_at_risk_levels() {
    let r = run_monte_carlo_simulation(&variable_loan(500, 3)).unwrap();
    let baseline = r.percentiles.p50.total_cost;
    assert_eq!(calculate_value_at_risk(&r, baseline, 0.5).unwrap(), 0.0);
    assert!(calculate_value_at_risk(&r, baseline, 0.9).unwrap() >= 0.0);
    assert!(calculate_value_at_risk(&r, baseline, 0.1).unwrap() <= 0.0);
    assert!(matches!(
        calculate_value_at_risk(&r, baseline, 0.95),
        Err(SbaCalcError::InvalidConfidenceLevel(_))
    ));
}

#[test]
fn test_rate_simulation_envelope() {
    let out = run_rate_simulation(&RateRiskInput {
        simulation: variable_loan(250, 8),
        baseline_cost: Some(700_000.0),
        confidence_level: 0.75,
    })
    .unwrap();
    let r = &out.result;
    assert_eq!(r.baseline_cost, 700_000.0);
    let expected = r.simulation.percentiles.p75.total_cost - 700_000.0;
    assert!((r.value_at_risk - expected).abs() < 0.01);
    assert!(out.warnings.is_empty());
}
