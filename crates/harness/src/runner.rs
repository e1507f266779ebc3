//! Parallel scenario execution with retries and failure artifacts
//!
//! Scenarios are independent: each gets a fresh driver session and runs
//! under its own timeout, so parallelism is a semaphore away. Retries exist
//! for automated environments only; a scenario that passes on a retry is
//! reported flaky rather than silently green.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use todocheck_contract::{
    run_scenario, Driver, ExecOptions, Scenario, ScenarioRun, SimDriver, SimQuirks,
};

use crate::config::ArtifactPolicy;
use crate::error::{HarnessError, HarnessResult};
use crate::playwright::{session_config, PlaywrightConfig, PlaywrightDriver};

/// Creates one fresh driver session per scenario attempt.
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn create(&self, attempt: u32) -> HarnessResult<Box<dyn Driver + Send>>;

    /// Backend name for the report header.
    fn backend(&self) -> String;
}

/// Browser sessions through the Playwright sidecar.
pub struct PlaywrightFactory {
    pub config: PlaywrightConfig,
    pub trace: ArtifactPolicy,
    pub video: ArtifactPolicy,
}

#[async_trait]
impl DriverFactory for PlaywrightFactory {
    async fn create(&self, attempt: u32) -> HarnessResult<Box<dyn Driver + Send>> {
        let config = session_config(&self.config, self.trace, self.video, attempt);
        let driver = PlaywrightDriver::launch(config).await?;
        Ok(Box::new(driver))
    }

    fn backend(&self) -> String {
        format!("playwright:{}", self.config.browser.as_str())
    }
}

/// In-memory sessions; no browser involved.
pub struct SimFactory {
    pub quirks: SimQuirks,
}

impl SimFactory {
    pub fn conforming() -> Self {
        SimFactory { quirks: SimQuirks::default() }
    }
}

#[async_trait]
impl DriverFactory for SimFactory {
    async fn create(&self, _attempt: u32) -> HarnessResult<Box<dyn Driver + Send>> {
        Ok(Box::new(SimDriver::with_quirks(self.quirks)))
    }

    fn backend(&self) -> String {
        "sim".to_string()
    }
}

/// Final classification of one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    /// Passed, but only on a retry.
    Flaky,
    Failed,
    TimedOut,
}

/// One attempt of one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptReport {
    pub attempt: u32,
    pub run: ScenarioRun,
    /// Diagnostics captured for this attempt; empty unless it failed.
    pub artifacts: Vec<PathBuf>,
}

/// All attempts of one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    pub tags: Vec<String>,
    pub outcome: Outcome,
    pub attempts: Vec<AttemptReport>,
    pub duration_ms: u64,
}

/// Aggregate over the whole suite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub flaky: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteResult {
    /// Flaky counts as passed for exit purposes; it is surfaced separately.
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Execution knobs for the suite.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Concurrent scenario sessions.
    pub workers: usize,
    /// Additional attempts per failed scenario.
    pub retries: u32,
    pub exec: ExecOptions,
    /// Ceiling for one attempt.
    pub scenario_timeout: Duration,
    /// Failure artifacts land under here, one directory per scenario.
    pub artifact_dir: PathBuf,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        RunnerOptions {
            workers: 1,
            retries: 0,
            exec: ExecOptions::default(),
            scenario_timeout: Duration::from_secs(90),
            artifact_dir: PathBuf::from("test-results"),
        }
    }
}

/// Runs a scenario set against one driver backend.
pub struct Runner {
    options: RunnerOptions,
}

impl Runner {
    pub fn new(options: RunnerOptions) -> Self {
        Runner { options }
    }

    /// Run every scenario; report order matches input order.
    pub async fn run(
        &self,
        scenarios: Vec<Scenario>,
        factory: Arc<dyn DriverFactory>,
    ) -> HarnessResult<SuiteResult> {
        let start = Instant::now();
        let total = scenarios.len();
        let semaphore = Arc::new(Semaphore::new(self.options.workers.max(1)));
        let mut join_set = JoinSet::new();

        info!("running {} scenario(s) against {}", total, factory.backend());

        for (index, scenario) in scenarios.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let factory = Arc::clone(&factory);
            let options = self.options.clone();

            join_set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("scenario semaphore closed");
                let report = run_with_retries(&scenario, factory.as_ref(), &options).await;
                (index, report)
            });
        }

        let mut indexed: Vec<(usize, ScenarioReport)> = Vec::with_capacity(total);
        while let Some(joined) = join_set.join_next().await {
            let (index, report) = joined
                .map_err(|e| HarnessError::Internal(format!("scenario task panicked: {}", e)))?;
            indexed.push((index, report));
        }
        indexed.sort_by_key(|(index, _)| *index);

        let scenarios: Vec<ScenarioReport> =
            indexed.into_iter().map(|(_, report)| report).collect();

        let passed = scenarios.iter().filter(|s| s.outcome == Outcome::Passed).count();
        let flaky = scenarios.iter().filter(|s| s.outcome == Outcome::Flaky).count();
        let failed = scenarios
            .iter()
            .filter(|s| matches!(s.outcome, Outcome::Failed | Outcome::TimedOut))
            .count();
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "suite finished: {} passed, {} flaky, {} failed ({} ms)",
            passed, flaky, failed, duration_ms
        );

        Ok(SuiteResult { total, passed, flaky, failed, duration_ms, scenarios })
    }
}

async fn run_with_retries(
    scenario: &Scenario,
    factory: &dyn DriverFactory,
    options: &RunnerOptions,
) -> ScenarioReport {
    let start = Instant::now();
    let mut attempts = Vec::new();
    let mut outcome = Outcome::Failed;

    for attempt in 0..=options.retries {
        if attempt > 0 {
            warn!("retrying '{}' (attempt {})", scenario.name, attempt + 1);
        }

        let mut driver = match factory.create(attempt).await {
            Ok(driver) => driver,
            Err(e) => {
                error!("✗ {} - driver startup failed: {}", scenario.name, e);
                attempts.push(AttemptReport {
                    attempt,
                    run: ScenarioRun::aborted(scenario, format!("driver startup failed: {}", e)),
                    artifacts: Vec::new(),
                });
                continue;
            }
        };

        let timed_run = tokio::time::timeout(
            options.scenario_timeout,
            run_scenario(driver.as_mut(), scenario, &options.exec),
        )
        .await;

        match timed_run {
            Ok(run) if run.success => {
                if let Err(e) = driver.close().await {
                    warn!("driver close failed after pass: {}", e);
                }
                info!("✓ {} ({} ms)", scenario.name, run.duration_ms);
                attempts.push(AttemptReport { attempt, run, artifacts: Vec::new() });
                outcome = if attempt == 0 { Outcome::Passed } else { Outcome::Flaky };
                break;
            }
            Ok(run) => {
                error!(
                    "✗ {} - {}",
                    scenario.name,
                    run.error.as_deref().unwrap_or("unknown error")
                );
                let artifacts =
                    capture_failure_artifacts(driver.as_mut(), scenario, attempt, options).await;
                if let Err(e) = driver.close().await {
                    warn!("driver close failed after failure: {}", e);
                }
                attempts.push(AttemptReport { attempt, run, artifacts });
                outcome = Outcome::Failed;
            }
            Err(_) => {
                error!(
                    "✗ {} - timed out after {:?}",
                    scenario.name, options.scenario_timeout
                );
                let artifacts =
                    capture_failure_artifacts(driver.as_mut(), scenario, attempt, options).await;
                if let Err(e) = driver.close().await {
                    warn!("driver close failed after timeout: {}", e);
                }
                attempts.push(AttemptReport {
                    attempt,
                    run: ScenarioRun::aborted(
                        scenario,
                        format!("timed out after {:?}", options.scenario_timeout),
                    ),
                    artifacts,
                });
                outcome = Outcome::TimedOut;
            }
        }
    }

    ScenarioReport {
        name: scenario.name.clone(),
        tags: scenario.tags.clone(),
        outcome,
        attempts,
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

async fn capture_failure_artifacts(
    driver: &mut dyn Driver,
    scenario: &Scenario,
    attempt: u32,
    options: &RunnerOptions,
) -> Vec<PathBuf> {
    let dir = options
        .artifact_dir
        .join(sanitize(&scenario.name))
        .join(format!("attempt-{}", attempt + 1));

    match driver.capture_artifacts(&dir).await {
        Ok(artifacts) => artifacts,
        Err(e) => {
            warn!("artifact capture failed for '{}': {}", scenario.name, e);
            Vec::new()
        }
    }
}

/// Scenario names become directory names.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}

/// Apply tag/name filters to a scenario set.
pub fn select(
    scenarios: Vec<Scenario>,
    tag: Option<&str>,
    name: Option<&str>,
) -> Vec<Scenario> {
    scenarios
        .into_iter()
        .filter(|s| tag.map_or(true, |t| s.has_tag(t)))
        .filter(|s| name.map_or(true, |n| s.name == n))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_directory_names_safe() {
        assert_eq!(sanitize("add-via-button"), "add-via-button");
        assert_eq!(sanitize("weird / name?"), "weird---name-");
    }

    #[test]
    fn select_filters_by_tag_and_name() {
        let scenarios = todocheck_contract::catalog::builtin();
        let total = scenarios.len();

        let all = select(scenarios.clone(), None, None);
        assert_eq!(all.len(), total);

        let adding = select(scenarios.clone(), Some("adding"), None);
        assert!(!adding.is_empty());
        assert!(adding.iter().all(|s| s.has_tag("adding")));

        let one = select(scenarios.clone(), None, Some("heading-visible"));
        assert_eq!(one.len(), 1);

        let none = select(scenarios, Some("adding"), Some("heading-visible"));
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn flaky_scenarios_are_classified_as_flaky() {
        use todocheck_contract::{Check, Element, Step};

        // A surface that suppresses the empty message only on the first
        // attempt: the scenario fails once, then passes on retry.
        struct FlakyFactory {
            failures: std::sync::atomic::AtomicU32,
        }

        #[async_trait]
        impl DriverFactory for FlakyFactory {
            async fn create(&self, _attempt: u32) -> HarnessResult<Box<dyn Driver + Send>> {
                let remaining = self.failures.load(std::sync::atomic::Ordering::SeqCst);
                let quirks = if remaining > 0 {
                    self.failures.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
                    SimQuirks { hide_empty_message: true, ..Default::default() }
                } else {
                    SimQuirks::default()
                };
                Ok(Box::new(SimDriver::with_quirks(quirks)))
            }

            fn backend(&self) -> String {
                "sim:flaky".to_string()
            }
        }

        let scenario = Scenario {
            name: "empty-message-appears".to_string(),
            description: String::new(),
            tags: vec![],
            steps: vec![
                Step::Navigate,
                Step::Expect { check: Check::Visible { target: Element::EmptyMessage } },
            ],
        };

        let artifact_dir = tempfile::tempdir().unwrap();
        let runner = Runner::new(RunnerOptions {
            workers: 1,
            retries: 2,
            exec: ExecOptions::fast(),
            scenario_timeout: Duration::from_secs(5),
            artifact_dir: artifact_dir.path().to_path_buf(),
        });

        let factory = Arc::new(FlakyFactory { failures: std::sync::atomic::AtomicU32::new(1) });
        let result = runner.run(vec![scenario], factory).await.unwrap();

        assert_eq!(result.total, 1);
        assert_eq!(result.flaky, 1);
        assert_eq!(result.failed, 0);
        assert!(result.all_passed());

        let report = &result.scenarios[0];
        assert_eq!(report.outcome, Outcome::Flaky);
        assert_eq!(report.attempts.len(), 2);
        // The failed first attempt captured diagnostics; the pass did not.
        assert!(!report.attempts[0].artifacts.is_empty());
        assert!(report.attempts[1].artifacts.is_empty());
    }

    #[tokio::test]
    async fn hung_scenarios_time_out() {
        use todocheck_contract::{Check, DriverResult, Element, Key, Step, Verdict};
        use std::path::Path;

        /// Driver whose evaluation never returns.
        struct Stuck;

        #[async_trait]
        impl Driver for Stuck {
            fn name(&self) -> &str {
                "stuck"
            }

            async fn navigate(&mut self) -> DriverResult<()> {
                Ok(())
            }

            async fn fill(&mut self, _: &Element, _: &str) -> DriverResult<()> {
                Ok(())
            }

            async fn click(&mut self, _: &Element) -> DriverResult<()> {
                Ok(())
            }

            async fn press(&mut self, _: Option<&Element>, _: Key) -> DriverResult<()> {
                Ok(())
            }

            async fn set_checked(&mut self, _: &Element, _: bool) -> DriverResult<()> {
                Ok(())
            }

            async fn focus(&mut self, _: &Element) -> DriverResult<()> {
                Ok(())
            }

            async fn evaluate(&mut self, _: &Check) -> DriverResult<Verdict> {
                std::future::pending::<()>().await;
                unreachable!()
            }

            async fn capture_artifacts(&mut self, _: &Path) -> DriverResult<Vec<PathBuf>> {
                Ok(Vec::new())
            }

            async fn close(&mut self) -> DriverResult<()> {
                Ok(())
            }
        }

        struct StuckFactory;

        #[async_trait]
        impl DriverFactory for StuckFactory {
            async fn create(&self, _: u32) -> HarnessResult<Box<dyn Driver + Send>> {
                Ok(Box::new(Stuck))
            }

            fn backend(&self) -> String {
                "stuck".to_string()
            }
        }

        let scenario = Scenario {
            name: "never-settles".to_string(),
            description: String::new(),
            tags: vec![],
            steps: vec![
                Step::Navigate,
                Step::Expect { check: Check::Visible { target: Element::EmptyMessage } },
            ],
        };

        let artifact_dir = tempfile::tempdir().unwrap();
        let runner = Runner::new(RunnerOptions {
            workers: 1,
            retries: 0,
            exec: ExecOptions::default(),
            scenario_timeout: Duration::from_millis(100),
            artifact_dir: artifact_dir.path().to_path_buf(),
        });

        let result = runner.run(vec![scenario], Arc::new(StuckFactory)).await.unwrap();
        assert_eq!(result.failed, 1);
        assert_eq!(result.scenarios[0].outcome, Outcome::TimedOut);
    }
}
