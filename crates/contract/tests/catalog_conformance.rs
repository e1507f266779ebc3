//! The built-in catalog must hold on a surface that follows the rules.

use todocheck_contract::{catalog, run_scenario, ExecOptions, SimDriver};

#[tokio::test]
async fn builtin_catalog_passes_on_a_conforming_surface() {
    for scenario in catalog::builtin() {
        let mut driver = SimDriver::conforming();
        let run = run_scenario(&mut driver, &scenario, &ExecOptions::fast()).await;
        assert!(
            run.success,
            "scenario '{}' failed: {:?}",
            scenario.name, run.error
        );
    }
}

#[tokio::test]
async fn scenarios_are_independent_of_execution_order() {
    // Running the catalog in reverse must not change any outcome; every
    // scenario owns a fresh session.
    let mut scenarios = catalog::builtin();
    scenarios.reverse();
    for scenario in scenarios {
        let mut driver = SimDriver::conforming();
        let run = run_scenario(&mut driver, &scenario, &ExecOptions::fast()).await;
        assert!(
            run.success,
            "scenario '{}' failed when run out of order: {:?}",
            scenario.name, run.error
        );
    }
}
