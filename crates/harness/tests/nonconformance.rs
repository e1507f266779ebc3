//! The catalog must reject surfaces that break the rules
//!
//! Each simulated fault violates exactly one behavioral guarantee; the
//! scenarios policing that guarantee must fail, and nothing else may.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use todocheck_contract::{catalog, ExecOptions, SimQuirks};
use todocheck_harness::{Outcome, Runner, RunnerOptions, SimFactory};

async fn failed_scenarios(quirks: SimQuirks) -> BTreeSet<String> {
    let artifact_dir = tempfile::tempdir().unwrap();
    let runner = Runner::new(RunnerOptions {
        workers: 4,
        retries: 0,
        exec: ExecOptions::fast(),
        scenario_timeout: Duration::from_secs(30),
        artifact_dir: artifact_dir.path().to_path_buf(),
    });

    let result = runner
        .run(catalog::builtin(), Arc::new(SimFactory { quirks }))
        .await
        .unwrap();

    result
        .scenarios
        .into_iter()
        .filter(|s| matches!(s.outcome, Outcome::Failed | Outcome::TimedOut))
        .map(|s| s.name)
        .collect()
}

fn names(expected: &[&str]) -> BTreeSet<String> {
    expected.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn untrimmed_storage_is_caught() {
    let failed = failed_scenarios(SimQuirks { skip_trim: true, ..Default::default() }).await;
    assert_eq!(failed, names(&["trims-submitted-text"]));
}

#[tokio::test]
async fn accepting_blank_submissions_is_caught() {
    let failed = failed_scenarios(SimQuirks { accept_blank: true, ..Default::default() }).await;
    assert_eq!(
        failed,
        names(&["reject-whitespace-only", "reject-empty-submit", "newline-only-input"])
    );
}

#[tokio::test]
async fn cross_item_toggling_is_caught() {
    let failed = failed_scenarios(SimQuirks { toggle_all: true, ..Default::default() }).await;
    // The mixed workflow also trips over the third item's stray toggle.
    assert_eq!(failed, names(&["independent-toggles", "add-toggle-delete"]));
}

#[tokio::test]
async fn deleting_the_wrong_item_is_caught() {
    let failed =
        failed_scenarios(SimQuirks { delete_off_by_one: true, ..Default::default() }).await;
    assert_eq!(
        failed,
        names(&["delete-middle-item", "add-toggle-delete", "interleaved-operations"])
    );
}

#[tokio::test]
async fn retaining_the_input_after_submit_is_caught() {
    let failed = failed_scenarios(SimQuirks { keep_input: true, ..Default::default() }).await;
    assert_eq!(
        failed,
        names(&["add-via-button", "add-via-enter", "input-clear-enables-next-add"])
    );
}

#[tokio::test]
async fn missing_empty_state_is_caught() {
    let failed =
        failed_scenarios(SimQuirks { hide_empty_message: true, ..Default::default() }).await;
    assert_eq!(
        failed,
        names(&[
            "empty-message-on-load",
            "reject-whitespace-only",
            "reject-empty-submit",
            "newline-only-input",
            "delete-restores-empty-state",
            "delete-until-empty",
            "empty-state-returns",
        ])
    );
}

#[tokio::test]
async fn missing_strikethrough_is_caught() {
    let failed =
        failed_scenarios(SimQuirks { no_strikethrough: true, ..Default::default() }).await;
    assert_eq!(failed, names(&["completed-strikethrough"]));
}

#[tokio::test]
async fn failed_attempts_keep_diagnostics() {
    let artifact_dir = tempfile::tempdir().unwrap();
    let runner = Runner::new(RunnerOptions {
        workers: 1,
        retries: 0,
        exec: ExecOptions::fast(),
        scenario_timeout: Duration::from_secs(30),
        artifact_dir: artifact_dir.path().to_path_buf(),
    });

    let scenarios: Vec<_> = catalog::builtin()
        .into_iter()
        .filter(|s| s.name == "empty-message-on-load")
        .collect();

    let result = runner
        .run(
            scenarios,
            Arc::new(SimFactory {
                quirks: SimQuirks { hide_empty_message: true, ..Default::default() },
            }),
        )
        .await
        .unwrap();

    assert_eq!(result.failed, 1);
    let attempt = &result.scenarios[0].attempts[0];
    assert_eq!(attempt.artifacts.len(), 1);
    assert!(attempt.artifacts[0].ends_with("sim-state.json"));
    assert!(attempt.artifacts[0].exists());
}
