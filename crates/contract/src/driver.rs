//! The driver seam between scenarios and a concrete UI backend

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::DriverResult;
use crate::step::{Check, Key};
use crate::surface::Element;

/// Outcome of evaluating a [`Check`] once.
#[derive(Debug, Clone)]
pub struct Verdict {
    /// Whether the check held.
    pub passed: bool,
    /// What was actually observed, for failure messages.
    pub actual: String,
}

impl Verdict {
    pub fn pass(actual: impl Into<String>) -> Self {
        Verdict { passed: true, actual: actual.into() }
    }

    pub fn fail(actual: impl Into<String>) -> Self {
        Verdict { passed: false, actual: actual.into() }
    }

    pub fn from_bool(passed: bool, actual: impl Into<String>) -> Self {
        Verdict { passed, actual: actual.into() }
    }
}

/// One isolated session against the target surface.
///
/// Actions complete (or fail) before returning; the executor never issues the
/// next step while one is in flight. A driver owns exactly one session, so
/// scenarios running in parallel never share state through it.
#[async_trait]
pub trait Driver: Send {
    /// Backend name for reports, e.g. `playwright:chromium`.
    fn name(&self) -> &str;

    /// Load the target surface fresh and wait for it to settle.
    async fn navigate(&mut self) -> DriverResult<()>;

    /// Replace the content of a text input.
    async fn fill(&mut self, target: &Element, value: &str) -> DriverResult<()>;

    /// Click an element.
    async fn click(&mut self, target: &Element) -> DriverResult<()>;

    /// Press a key into an element, or at page level when `target` is `None`.
    async fn press(&mut self, target: Option<&Element>, key: Key) -> DriverResult<()>;

    /// Drive a checkbox to the requested state.
    async fn set_checked(&mut self, target: &Element, checked: bool) -> DriverResult<()>;

    /// Give an element keyboard focus.
    async fn focus(&mut self, target: &Element) -> DriverResult<()>;

    /// Evaluate a check once, without retrying.
    async fn evaluate(&mut self, check: &Check) -> DriverResult<Verdict>;

    /// Capture failure diagnostics into `dir`; returns the files written.
    async fn capture_artifacts(&mut self, dir: &Path) -> DriverResult<Vec<PathBuf>>;

    /// Release the session. Called exactly once, after the last step.
    async fn close(&mut self) -> DriverResult<()>;
}
