//! Harness configuration and execution-environment detection
//!
//! Automated and interactive runs want opposite trade-offs: automation
//! retries scenarios to absorb transient timing flakiness and emits a
//! machine-readable report; interactive runs fail fast and print for humans.
//! One enumerated set of environment signals decides which mode applies, and
//! every mode-dependent default derives from that single decision.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::playwright::Browser;

/// Recognized automation signals, probed in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentSignal {
    /// `CI=true`
    Ci,
    /// `NOMAD_JOB_NAME` is set
    NomadJob,
    /// `DOCKER_ENV` is set
    DockerEnv,
}

impl EnvironmentSignal {
    pub const ALL: [EnvironmentSignal; 3] = [
        EnvironmentSignal::Ci,
        EnvironmentSignal::NomadJob,
        EnvironmentSignal::DockerEnv,
    ];

    pub fn var_name(&self) -> &'static str {
        match self {
            EnvironmentSignal::Ci => "CI",
            EnvironmentSignal::NomadJob => "NOMAD_JOB_NAME",
            EnvironmentSignal::DockerEnv => "DOCKER_ENV",
        }
    }

    fn is_set(&self, lookup: &impl Fn(&str) -> Option<String>) -> bool {
        match self {
            // CI carries boolean-ish values; only an explicit "true" counts.
            EnvironmentSignal::Ci => lookup("CI").as_deref() == Some("true"),
            other => lookup(other.var_name()).map_or(false, |v| !v.is_empty()),
        }
    }
}

/// Whether this run is driven by automation or by a person at a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "signal", rename_all = "snake_case")]
pub enum ExecutionEnvironment {
    Interactive,
    Automated(EnvironmentSignal),
}

impl ExecutionEnvironment {
    /// Detect from the process environment.
    pub fn detect() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Detect from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        for signal in EnvironmentSignal::ALL {
            if signal.is_set(&lookup) {
                debug!(signal = signal.var_name(), "automated environment detected");
                return ExecutionEnvironment::Automated(signal);
            }
        }
        ExecutionEnvironment::Interactive
    }

    pub fn is_automated(&self) -> bool {
        matches!(self, ExecutionEnvironment::Automated(_))
    }
}

/// When to retain a diagnostic artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactPolicy {
    Off,
    /// Only for attempts that failed.
    OnFailure,
    /// Only for retry attempts (the first attempt runs without it).
    OnRetry,
    Always,
}

/// How the suite result is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    Human,
    Json,
}

/// Full harness configuration.
///
/// Defaults derive from the detected execution environment; CLI flags and
/// environment variables override individual fields afterwards.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Where the target surface is served.
    pub base_url: String,

    pub environment: ExecutionEnvironment,

    /// Concurrent scenario sessions.
    pub workers: usize,

    /// Additional attempts per failed scenario.
    pub retries: u32,

    pub report_format: ReportFormat,

    /// Ceiling for a single polled assertion.
    pub assert_timeout: Duration,

    /// Ceiling for one whole scenario, all retries excluded.
    pub scenario_timeout: Duration,

    /// Ceiling for a single driver action.
    pub action_timeout: Duration,

    /// Ceiling for the initial page load.
    pub navigation_timeout: Duration,

    /// Where reports and failure artifacts land.
    pub artifact_dir: PathBuf,

    pub browser: Browser,
    pub headless: bool,

    /// Command that starts the frontend when it is not already running.
    pub server_command: Option<String>,

    /// Working directory for `server_command`.
    pub server_dir: Option<PathBuf>,

    pub server_startup_timeout: Duration,

    pub trace: ArtifactPolicy,
    pub video: ArtifactPolicy,
}

/// Fallback address of a local frontend dev server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5173";

impl HarnessConfig {
    /// Build from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = ExecutionEnvironment::from_lookup(&lookup);
        let automated = environment.is_automated();

        let base_url = lookup("BASE_URL")
            .or_else(|| lookup("FRONTEND_URL"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let workers = if automated { 1 } else { default_parallelism() };

        HarnessConfig {
            base_url,
            environment,
            workers,
            retries: if automated { 2 } else { 0 },
            report_format: if automated { ReportFormat::Json } else { ReportFormat::Human },
            assert_timeout: Duration::from_secs(5),
            scenario_timeout: Duration::from_secs(90),
            action_timeout: Duration::from_secs(10),
            navigation_timeout: Duration::from_secs(30),
            artifact_dir: PathBuf::from("test-results"),
            browser: Browser::default(),
            headless: true,
            server_command: lookup("FRONTEND_CMD"),
            server_dir: None,
            server_startup_timeout: Duration::from_secs(120),
            trace: ArtifactPolicy::OnRetry,
            video: ArtifactPolicy::OnFailure,
        }
    }

    /// Whether the harness may start the frontend itself. Automated
    /// environments are expected to have it running already.
    pub fn may_spawn_server(&self) -> bool {
        !self.environment.is_automated()
    }
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
