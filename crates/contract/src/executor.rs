//! Sequential scenario execution with polled assertions
//!
//! Actions run strictly in order; each completes before the next is issued.
//! `Expect` steps tolerate the target's asynchronous rendering by polling the
//! driver until the check holds or a bounded timeout elapses. The first
//! failing step terminates the scenario.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::driver::Driver;
use crate::scenario::Scenario;
use crate::step::{Check, Step};

/// Knobs for a single scenario execution.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Ceiling for one polled assertion to become true.
    pub assert_timeout: Duration,
    /// Interval between assertion polls.
    pub poll_interval: Duration,
}

impl Default for ExecOptions {
    fn default() -> Self {
        ExecOptions {
            assert_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl ExecOptions {
    /// Tight timings for drivers that render synchronously.
    pub fn fast() -> Self {
        ExecOptions {
            assert_timeout: Duration::from_millis(50),
            poll_interval: Duration::from_millis(5),
        }
    }
}

/// Outcome of one executed step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub label: String,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Outcome of one scenario execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRun {
    pub scenario: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepReport>,
    pub error: Option<String>,
}

impl ScenarioRun {
    /// A run that never got to execute any step.
    pub fn aborted(scenario: &Scenario, error: impl Into<String>) -> Self {
        ScenarioRun {
            scenario: scenario.name.clone(),
            success: false,
            duration_ms: 0,
            steps: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Execute one scenario against one driver session.
///
/// Failures are embedded in the returned report; this function itself never
/// errors so a broken driver cannot take down the surrounding run loop.
pub async fn run_scenario(
    driver: &mut dyn Driver,
    scenario: &Scenario,
    options: &ExecOptions,
) -> ScenarioRun {
    let start = Instant::now();
    let mut steps = Vec::new();
    let mut failure: Option<String> = None;

    debug!(scenario = %scenario.name, "executing");

    for step in &scenario.steps {
        let step_start = Instant::now();
        let label = step.label();
        debug!(step = %label, "step");

        let result = match step {
            Step::Navigate => driver.navigate().await.map_err(|e| e.to_string()),
            Step::Fill { target, value } => {
                driver.fill(target, value).await.map_err(|e| e.to_string())
            }
            Step::Click { target } => driver.click(target).await.map_err(|e| e.to_string()),
            Step::Press { target, key } => driver
                .press(target.as_ref(), *key)
                .await
                .map_err(|e| e.to_string()),
            Step::Check { target } => driver
                .set_checked(target, true)
                .await
                .map_err(|e| e.to_string()),
            Step::Uncheck { target } => driver
                .set_checked(target, false)
                .await
                .map_err(|e| e.to_string()),
            Step::Focus { target } => driver.focus(target).await.map_err(|e| e.to_string()),
            Step::Expect { check } => poll_check(driver, check, options).await,
        };

        let duration_ms = step_start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                steps.push(StepReport { label, duration_ms, error: None });
            }
            Err(error) => {
                steps.push(StepReport {
                    label,
                    duration_ms,
                    error: Some(error.clone()),
                });
                failure = Some(error);
                break;
            }
        }
    }

    ScenarioRun {
        scenario: scenario.name.clone(),
        success: failure.is_none(),
        duration_ms: start.elapsed().as_millis() as u64,
        steps,
        error: failure,
    }
}

/// Poll one check until it holds or the assertion timeout elapses.
///
/// Evaluation errors are retried like failing verdicts: the target may still
/// be rendering, in which case an element can legitimately be missing for a
/// few polls.
async fn poll_check(
    driver: &mut dyn Driver,
    check: &Check,
    options: &ExecOptions,
) -> Result<(), String> {
    let deadline = Instant::now() + options.assert_timeout;
    let mut last_observed = String::from("never evaluated");

    loop {
        match driver.evaluate(check).await {
            Ok(verdict) if verdict.passed => return Ok(()),
            Ok(verdict) => last_observed = verdict.actual,
            Err(e) => last_observed = format!("evaluation error: {}", e),
        }

        if Instant::now() >= deadline {
            return Err(format!(
                "{} did not hold within {:?} (last observed: {})",
                check.describe(),
                options.assert_timeout,
                last_observed
            ));
        }

        tokio::time::sleep(options.poll_interval).await;
    }
}
