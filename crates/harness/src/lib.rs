//! Todocheck harness
//!
//! Runs the to-do list conformance contract against a real target:
//! - Detects the execution environment and derives defaults from it
//!   (retries, workers, report format)
//! - Reuses or starts the frontend serving the target surface
//! - Drives a browser through a Playwright sidecar speaking a JSON-line
//!   protocol, one isolated session per scenario
//! - Runs scenarios in parallel with per-scenario timeouts and retries,
//!   keeping diagnostics only for failures
//! - Reports as JSON for automation and as colored terminal output otherwise
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  conformance entry (clap)                                   │
//! │    ├── HarnessConfig::from_env() + flag overrides           │
//! │    ├── FrontendHandle::ensure()  reuse-or-spawn + readiness │
//! │    └── Runner::run(scenarios, factory)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Runner                                                     │
//! │    ├── semaphore-bounded parallel scenarios                 │
//! │    ├── retry budget, flaky classification                   │
//! │    └── failure artifacts (screenshot, trace, video)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PlaywrightDriver ── Bridge ── node sidecar ── browser      │
//! │  SimDriver (hermetic, no browser)                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod bridge;

pub mod config;
pub mod error;
pub mod playwright;
pub mod report;
pub mod runner;
pub mod server;

pub use config::{
    ArtifactPolicy, EnvironmentSignal, ExecutionEnvironment, HarnessConfig, ReportFormat,
};
pub use error::{HarnessError, HarnessResult};
pub use playwright::{Browser, PlaywrightConfig, PlaywrightDriver};
pub use report::Report;
pub use runner::{
    select, DriverFactory, Outcome, PlaywrightFactory, Runner, RunnerOptions, SimFactory,
    SuiteResult,
};
pub use server::{FrontendConfig, FrontendHandle};
