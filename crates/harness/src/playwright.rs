//! Browser-backed driver
//!
//! Translates the semantic surface vocabulary into accessible locators and
//! executes it through a Playwright sidecar. One driver owns one sidecar,
//! which owns one browser session; scenarios therefore never share a page.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use todocheck_contract::{Check, Driver, DriverError, DriverResult, Element, Key, TextMatch, Verdict};
use todocheck_contract::surface::{
    ADD_BUTTON_NAME, DELETE_BUTTON_NAME, EMPTY_MESSAGE_TEXT, HEADING_NAME, INPUT_PLACEHOLDER,
};

use crate::bridge::{Bridge, BridgeCommand, LocatorSpec};
use crate::error::HarnessResult;

/// Browser engine driven through the sidecar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }

    /// Parse a user-supplied browser name, defaulting to chromium.
    pub fn parse(name: &str) -> Self {
        match name {
            "firefox" => Browser::Firefox,
            "webkit" => Browser::Webkit,
            _ => Browser::Chromium,
        }
    }
}

/// Configuration for one browser session.
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub base_url: String,
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub action_timeout: Duration,
    pub navigation_timeout: Duration,
    /// Record a trace for this session.
    pub trace: bool,
    /// Record video for this session; discarded unless artifacts are captured.
    pub video: bool,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        PlaywrightConfig {
            base_url: "http://localhost:5173".to_string(),
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            action_timeout: Duration::from_secs(10),
            navigation_timeout: Duration::from_secs(30),
            trace: false,
            video: false,
        }
    }
}

/// [`Driver`] implementation over a Playwright sidecar.
pub struct PlaywrightDriver {
    bridge: Option<Bridge>,
    name: String,
    tracing_active: bool,
    /// Where to deposit the recorded video at close, when a failure asked
    /// for it.
    keep_video_in: Option<PathBuf>,
    // Owns the recordings until close decides their fate
    video_dir_guard: Option<tempfile::TempDir>,
}

impl PlaywrightDriver {
    /// Launch a sidecar and open a fresh browser session.
    pub async fn launch(config: PlaywrightConfig) -> HarnessResult<Self> {
        // Reply timeout must exceed every in-page timeout or slow loads
        // would be misreported as protocol failures
        let call_timeout = config.navigation_timeout + Duration::from_secs(15);
        let mut bridge = Bridge::spawn(call_timeout).await?;

        let video_dir = if config.video { Some(tempfile::tempdir()?) } else { None };

        bridge
            .call(&BridgeCommand::Open {
                browser: config.browser.as_str(),
                headless: config.headless,
                base_url: &config.base_url,
                viewport_width: config.viewport_width,
                viewport_height: config.viewport_height,
                action_timeout_ms: config.action_timeout.as_millis() as u64,
                navigation_timeout_ms: config.navigation_timeout.as_millis() as u64,
                trace: config.trace,
                video_dir: video_dir
                    .as_ref()
                    .map(|d| d.path().to_string_lossy().to_string()),
            })
            .await?;

        debug!(browser = config.browser.as_str(), "browser session open");

        Ok(PlaywrightDriver {
            bridge: Some(bridge),
            name: format!("playwright:{}", config.browser.as_str()),
            tracing_active: config.trace,
            keep_video_in: None,
            video_dir_guard: video_dir,
        })
    }

    fn bridge(&mut self) -> DriverResult<&mut Bridge> {
        self.bridge
            .as_mut()
            .ok_or_else(|| DriverError::Session("session already closed".to_string()))
    }

    async fn call(&mut self, action: &str, command: BridgeCommand<'_>) -> DriverResult<serde_json::Value> {
        self.bridge()?
            .call(&command)
            .await
            .map_err(|e| DriverError::action(action, e))
    }

    async fn query(&mut self, command: BridgeCommand<'_>) -> DriverResult<serde_json::Value> {
        self.bridge()?
            .call(&command)
            .await
            .map_err(|e| DriverError::Evaluate(e.to_string()))
    }

    async fn query_bool(&mut self, command: BridgeCommand<'_>, field: &str) -> DriverResult<bool> {
        let data = self.query(command).await?;
        data.get(field)
            .and_then(|v| v.as_bool())
            .ok_or_else(|| DriverError::Evaluate(format!("missing '{}' in sidecar reply", field)))
    }

    async fn query_count(&mut self, locator: LocatorSpec) -> DriverResult<usize> {
        let data = self.query(BridgeCommand::Count { locator }).await?;
        data.get("count")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .ok_or_else(|| DriverError::Evaluate("missing 'count' in sidecar reply".to_string()))
    }

    /// Ordered item texts, with embedded control text stripped.
    async fn item_texts(&mut self) -> DriverResult<Vec<String>> {
        let data = self
            .query(BridgeCommand::ItemTexts { locator: locator_for(&Element::Item { nth: 0 }, false) })
            .await?;
        let texts = data
            .get("texts")
            .and_then(|v| v.as_array())
            .ok_or_else(|| DriverError::Evaluate("missing 'texts' in sidecar reply".to_string()))?;
        Ok(texts
            .iter()
            .map(|v| v.as_str().unwrap_or_default().to_string())
            .collect())
    }
}

/// Map a surface element to an accessible locator.
///
/// With `indexed` false the locator addresses every instance of the
/// element, which is what counting and enumeration want.
fn locator_for(element: &Element, indexed: bool) -> LocatorSpec {
    match element {
        Element::Heading => LocatorSpec::Role {
            role: "heading",
            name: Some(HEADING_NAME.to_string()),
            nth: None,
        },
        Element::Input => LocatorSpec::Placeholder {
            placeholder: INPUT_PLACEHOLDER.to_string(),
            nth: None,
        },
        Element::AddButton => LocatorSpec::Role {
            role: "button",
            name: Some(ADD_BUTTON_NAME.to_string()),
            nth: None,
        },
        Element::Item { nth } => LocatorSpec::Role {
            role: "listitem",
            name: None,
            nth: indexed.then_some(*nth),
        },
        Element::ItemText { matcher } => match matcher {
            TextMatch::Exact(text) => LocatorSpec::Text { text: text.clone(), exact: true, nth: None },
            TextMatch::Contains(text) => {
                LocatorSpec::Text { text: text.clone(), exact: false, nth: None }
            }
        },
        Element::Checkbox { nth } => LocatorSpec::Role {
            role: "checkbox",
            name: None,
            nth: indexed.then_some(*nth),
        },
        Element::DeleteButton { nth } => LocatorSpec::Role {
            role: "button",
            name: Some(DELETE_BUTTON_NAME.to_string()),
            nth: indexed.then_some(*nth),
        },
        Element::EmptyMessage => LocatorSpec::Text {
            text: EMPTY_MESSAGE_TEXT.to_string(),
            exact: false,
            nth: None,
        },
    }
}

#[async_trait]
impl Driver for PlaywrightDriver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn navigate(&mut self) -> DriverResult<()> {
        self.call("navigate", BridgeCommand::Goto).await?;
        Ok(())
    }

    async fn fill(&mut self, target: &Element, value: &str) -> DriverResult<()> {
        self.call(
            "fill",
            BridgeCommand::Fill { locator: locator_for(target, true), value },
        )
        .await?;
        Ok(())
    }

    async fn click(&mut self, target: &Element) -> DriverResult<()> {
        self.call("click", BridgeCommand::Click { locator: locator_for(target, true) })
            .await?;
        Ok(())
    }

    async fn press(&mut self, target: Option<&Element>, key: Key) -> DriverResult<()> {
        self.call(
            "press",
            BridgeCommand::Press {
                locator: target.map(|el| locator_for(el, true)),
                key: key.as_str(),
            },
        )
        .await?;
        Ok(())
    }

    async fn set_checked(&mut self, target: &Element, checked: bool) -> DriverResult<()> {
        self.call(
            "set_checked",
            BridgeCommand::SetChecked { locator: locator_for(target, true), checked },
        )
        .await?;
        Ok(())
    }

    async fn focus(&mut self, target: &Element) -> DriverResult<()> {
        self.call("focus", BridgeCommand::Focus { locator: locator_for(target, true) })
            .await?;
        Ok(())
    }

    async fn evaluate(&mut self, check: &Check) -> DriverResult<Verdict> {
        match check {
            Check::Visible { target } => {
                let visible = self
                    .query_bool(
                        BridgeCommand::IsVisible { locator: locator_for(target, true) },
                        "visible",
                    )
                    .await?;
                Ok(Verdict::from_bool(visible, if visible { "visible" } else { "not visible" }))
            }
            Check::Absent { target } => {
                let count = self.query_count(locator_for(target, false)).await?;
                Ok(Verdict::from_bool(count == 0, format!("{} present", count)))
            }
            Check::Text { target, expected } => {
                let observed = match target {
                    Element::Item { nth } => self.item_texts().await?.get(*nth).cloned(),
                    _ => {
                        let data = self
                            .query(BridgeCommand::TextOf { locator: locator_for(target, true) })
                            .await?;
                        data.get("text")
                            .and_then(|v| v.as_str())
                            // Rendered text carries markup whitespace the
                            // surface never promises to control
                            .map(|t| t.trim().to_string())
                    }
                };
                match observed {
                    Some(text) => {
                        Ok(Verdict::from_bool(text == *expected, format!("{:?}", text)))
                    }
                    None => Ok(Verdict::fail("element absent")),
                }
            }
            Check::InputValue { expected } => {
                let data = self
                    .query(BridgeCommand::InputValue { locator: locator_for(&Element::Input, true) })
                    .await?;
                let value = data
                    .get("value")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                Ok(Verdict::from_bool(value == *expected, format!("{:?}", value)))
            }
            Check::Checked { nth, expected } => {
                let checked = self
                    .query_bool(
                        BridgeCommand::IsChecked {
                            locator: locator_for(&Element::Checkbox { nth: *nth }, true),
                        },
                        "checked",
                    )
                    .await?;
                Ok(Verdict::from_bool(checked == *expected, format!("checked={}", checked)))
            }
            Check::Count { target, expected } => {
                let count = self.query_count(locator_for(target, false)).await?;
                Ok(Verdict::from_bool(count == *expected, format!("count={}", count)))
            }
            Check::ItemsInOrder { expected } => {
                let texts = self.item_texts().await?;
                Ok(Verdict::from_bool(texts == *expected, format!("{:?}", texts)))
            }
            Check::StruckThrough { matcher, expected } => {
                let data = self
                    .query(BridgeCommand::TextDecoration {
                        locator: locator_for(&Element::ItemText { matcher: matcher.clone() }, true),
                    })
                    .await?;
                let decoration = data
                    .get("text_decoration")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                let struck = decoration.contains("line-through");
                Ok(Verdict::from_bool(
                    struck == *expected,
                    format!("text-decoration={:?}", decoration),
                ))
            }
            Check::Focused { target } => {
                let focused = self
                    .query_bool(
                        BridgeCommand::IsFocused { locator: locator_for(target, true) },
                        "focused",
                    )
                    .await?;
                Ok(Verdict::from_bool(focused, format!("focused={}", focused)))
            }
            Check::Enabled { target } => {
                let enabled = self
                    .query_bool(
                        BridgeCommand::IsEnabled { locator: locator_for(target, true) },
                        "enabled",
                    )
                    .await?;
                Ok(Verdict::from_bool(enabled, format!("enabled={}", enabled)))
            }
        }
    }

    async fn capture_artifacts(&mut self, dir: &Path) -> DriverResult<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let mut artifacts = Vec::new();

        let screenshot = dir.join("screenshot.png");
        match self
            .call(
                "screenshot",
                BridgeCommand::Screenshot { path: screenshot.to_string_lossy().to_string() },
            )
            .await
        {
            Ok(_) => artifacts.push(screenshot),
            Err(e) => warn!("screenshot capture failed: {}", e),
        }

        if self.tracing_active {
            let trace = dir.join("trace.zip");
            match self
                .call(
                    "trace_stop",
                    BridgeCommand::TraceStop { path: trace.to_string_lossy().to_string() },
                )
                .await
            {
                Ok(_) => {
                    self.tracing_active = false;
                    artifacts.push(trace);
                }
                Err(e) => warn!("trace capture failed: {}", e),
            }
        }

        // The recording only finalizes at close; remember where it belongs.
        if self.video_dir_guard.is_some() {
            self.keep_video_in = Some(dir.to_path_buf());
        }

        Ok(artifacts)
    }

    async fn close(&mut self) -> DriverResult<()> {
        let Some(bridge) = self.bridge.take() else {
            return Ok(());
        };

        let video_path = bridge
            .shutdown()
            .await
            .map_err(|e| DriverError::Session(e.to_string()))?;

        if let (Some(dir), Some(video)) = (self.keep_video_in.take(), video_path) {
            let dest = dir.join("video.webm");
            if let Err(e) = std::fs::copy(&video, &dest) {
                warn!("failed to retain video recording: {}", e);
            }
        }

        Ok(())
    }
}

/// Build a session config for one scenario attempt.
pub fn session_config(
    base: &PlaywrightConfig,
    trace_policy: crate::config::ArtifactPolicy,
    video_policy: crate::config::ArtifactPolicy,
    attempt: u32,
) -> PlaywrightConfig {
    use crate::config::ArtifactPolicy;

    let mut config = base.clone();
    config.trace = match trace_policy {
        ArtifactPolicy::Always => true,
        ArtifactPolicy::OnRetry => attempt > 0,
        ArtifactPolicy::OnFailure | ArtifactPolicy::Off => false,
    };
    config.video = !matches!(video_policy, ArtifactPolicy::Off);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elements_map_to_accessible_locators() {
        let spec = locator_for(&Element::AddButton, true);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["by"], "role");
        assert_eq!(json["role"], "button");
        assert_eq!(json["name"], "add todo");

        let spec = locator_for(&Element::Input, true);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["by"], "placeholder");
        assert_eq!(json["placeholder"], "Add a new todo");
    }

    #[test]
    fn counting_drops_the_index() {
        let spec = locator_for(&Element::Checkbox { nth: 3 }, false);
        let json = serde_json::to_value(&spec).unwrap();
        assert!(json.get("nth").is_none());

        let spec = locator_for(&Element::Checkbox { nth: 3 }, true);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["nth"], 3);
    }

    #[test]
    fn exact_text_matchers_request_exact_discovery() {
        let spec = locator_for(
            &Element::ItemText { matcher: TextMatch::Exact("Todo 1".to_string()) },
            true,
        );
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["by"], "text");
        assert_eq!(json["exact"], true);
    }

    #[test]
    fn browser_names_parse_with_chromium_fallback() {
        assert_eq!(Browser::parse("firefox"), Browser::Firefox);
        assert_eq!(Browser::parse("webkit"), Browser::Webkit);
        assert_eq!(Browser::parse("chromium"), Browser::Chromium);
        assert_eq!(Browser::parse("anything-else"), Browser::Chromium);
    }

    #[test]
    fn retry_attempts_enable_tracing_under_on_retry_policy() {
        use crate::config::ArtifactPolicy;

        let base = PlaywrightConfig::default();
        assert!(!session_config(&base, ArtifactPolicy::OnRetry, ArtifactPolicy::Off, 0).trace);
        assert!(session_config(&base, ArtifactPolicy::OnRetry, ArtifactPolicy::Off, 1).trace);
        assert!(session_config(&base, ArtifactPolicy::Always, ArtifactPolicy::Off, 0).trace);
        assert!(!session_config(&base, ArtifactPolicy::OnRetry, ArtifactPolicy::Off, 1).video);
        assert!(session_config(&base, ArtifactPolicy::Off, ArtifactPolicy::OnFailure, 0).video);
    }
}
