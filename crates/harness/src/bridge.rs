//! Playwright sidecar process and its wire protocol
//!
//! One sidecar owns one browser session. Commands go to its stdin as
//! newline-delimited JSON; every command produces exactly one reply line on
//! stdout. Keeping the process alive across steps lets observation commands
//! return values and keeps the page state where the scenario left it.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tracing::{debug, warn};

use crate::error::{HarnessError, HarnessResult};

/// How the sidecar locates an element.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub(crate) enum LocatorSpec {
    /// Accessible role, optionally narrowed by a case-insensitive name.
    Role {
        role: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        nth: Option<usize>,
    },
    /// Input placeholder content.
    Placeholder {
        placeholder: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        nth: Option<usize>,
    },
    /// Rendered text, exact or case-insensitive.
    Text {
        text: String,
        exact: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        nth: Option<usize>,
    },
}

/// One command to the sidecar.
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub(crate) enum BridgeCommand<'a> {
    Open {
        browser: &'a str,
        headless: bool,
        base_url: &'a str,
        viewport_width: u32,
        viewport_height: u32,
        action_timeout_ms: u64,
        navigation_timeout_ms: u64,
        trace: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        video_dir: Option<String>,
    },
    Goto,
    Fill { locator: LocatorSpec, value: &'a str },
    Click { locator: LocatorSpec },
    Press {
        #[serde(skip_serializing_if = "Option::is_none")]
        locator: Option<LocatorSpec>,
        key: &'a str,
    },
    SetChecked { locator: LocatorSpec, checked: bool },
    Focus { locator: LocatorSpec },
    IsVisible { locator: LocatorSpec },
    TextOf { locator: LocatorSpec },
    Count { locator: LocatorSpec },
    IsChecked { locator: LocatorSpec },
    InputValue { locator: LocatorSpec },
    IsFocused { locator: LocatorSpec },
    IsEnabled { locator: LocatorSpec },
    TextDecoration { locator: LocatorSpec },
    ItemTexts { locator: LocatorSpec },
    Screenshot { path: String },
    TraceStop { path: String },
    Close,
}

/// One reply from the sidecar.
#[derive(Debug, Deserialize)]
pub(crate) struct BridgeReply {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Handle to a running sidecar.
pub(crate) struct Bridge {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    call_timeout: Duration,
    // Keeps the script file alive for the sidecar's lifetime
    _script_dir: tempfile::TempDir,
}

impl Bridge {
    /// Spawn a sidecar and wait for its ready handshake.
    pub async fn spawn(call_timeout: Duration) -> HarnessResult<Self> {
        check_node_installed()?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, BRIDGE_SCRIPT)?;

        debug!("spawning browser sidecar: {}", script_path.display());

        let mut child = tokio::process::Command::new("node")
            .arg(&script_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| HarnessError::Bridge(format!("failed to spawn node: {}", e)))?;

        let stdin = child.stdin.take().ok_or(HarnessError::BridgeClosed)?;
        let stdout = child.stdout.take().ok_or(HarnessError::BridgeClosed)?;
        let stderr = child.stderr.take().ok_or(HarnessError::BridgeClosed)?;

        // Drain sidecar stderr into the log so a wedged browser is diagnosable
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(target: "bridge", "{}", line);
            }
        });

        let mut bridge = Bridge {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            call_timeout,
            _script_dir: script_dir,
        };

        let reply = bridge.read_reply().await?;
        if !reply.ok {
            let error = reply.error.unwrap_or_default();
            if error.starts_with("playwright-missing") {
                return Err(HarnessError::PlaywrightNotFound);
            }
            return Err(HarnessError::Bridge(error));
        }

        Ok(bridge)
    }

    /// Send one command and wait for its reply payload.
    pub async fn call(&mut self, command: &BridgeCommand<'_>) -> HarnessResult<serde_json::Value> {
        let line = serde_json::to_string(command)?;
        self.stdin.write_all(line.as_bytes()).await.map_err(|_| HarnessError::BridgeClosed)?;
        self.stdin.write_all(b"\n").await.map_err(|_| HarnessError::BridgeClosed)?;
        self.stdin.flush().await.map_err(|_| HarnessError::BridgeClosed)?;

        let reply = self.read_reply().await?;
        if reply.ok {
            Ok(reply.data)
        } else {
            Err(HarnessError::Bridge(reply.error.unwrap_or_else(|| "unknown error".to_string())))
        }
    }

    async fn read_reply(&mut self) -> HarnessResult<BridgeReply> {
        let line = tokio::time::timeout(self.call_timeout, self.stdout.next_line())
            .await
            .map_err(|_| HarnessError::Bridge("sidecar reply timed out".to_string()))?
            .map_err(|e| HarnessError::Bridge(e.to_string()))?
            .ok_or(HarnessError::BridgeClosed)?;

        Ok(serde_json::from_str(&line)?)
    }

    /// Close the session and reap the process. Returns the recorded video
    /// path, when there is one.
    pub async fn shutdown(mut self) -> HarnessResult<Option<PathBuf>> {
        let video_path = match self.call(&BridgeCommand::Close).await {
            Ok(data) => data
                .get("video_path")
                .and_then(|v| v.as_str())
                .map(PathBuf::from),
            Err(e) => {
                warn!("sidecar close failed: {}", e);
                None
            }
        };

        let _ = self.child.wait().await;
        Ok(video_path)
    }
}

/// Node must be on PATH for the sidecar to exist at all.
fn check_node_installed() -> HarnessResult<()> {
    let status = std::process::Command::new("node")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(status) if status.success() => Ok(()),
        _ => Err(HarnessError::NodeNotFound),
    }
}

/// The sidecar script. Written to a temp directory at spawn time.
const BRIDGE_SCRIPT: &str = r##"// Playwright sidecar: one browser session per process.
// Protocol: newline-delimited JSON commands on stdin, one reply per line.
const readline = require('readline');

let playwright;
try {
  playwright = require('playwright');
} catch (err) {
  process.stdout.write(
    JSON.stringify({ ok: false, error: 'playwright-missing: ' + err.message }) + '\n'
  );
  process.exit(3);
}

let browser = null;
let context = null;
let page = null;
let baseUrl = '';
let tracing = false;

function escapeRegex(s) {
  return s.replace(/[.*+?^${}()|[\]\\]/g, '\\$&');
}

function resolve(spec) {
  let loc;
  if (spec.by === 'role') {
    const opts = {};
    if (spec.name) opts.name = new RegExp(escapeRegex(spec.name), 'i');
    loc = page.getByRole(spec.role, opts);
  } else if (spec.by === 'placeholder') {
    loc = page.getByPlaceholder(spec.placeholder);
  } else if (spec.by === 'text') {
    loc = spec.exact
      ? page.getByText(spec.text, { exact: true })
      : page.getByText(new RegExp(escapeRegex(spec.text), 'i'));
  } else {
    throw new Error('unknown locator: ' + JSON.stringify(spec));
  }
  if (spec.nth !== null && spec.nth !== undefined) loc = loc.nth(spec.nth);
  return loc;
}

async function handle(msg) {
  switch (msg.cmd) {
    case 'open': {
      browser = await playwright[msg.browser].launch({ headless: msg.headless });
      const contextOpts = {
        viewport: { width: msg.viewport_width, height: msg.viewport_height },
      };
      if (msg.video_dir) contextOpts.recordVideo = { dir: msg.video_dir };
      context = await browser.newContext(contextOpts);
      if (msg.trace) {
        await context.tracing.start({ screenshots: true, snapshots: true });
        tracing = true;
      }
      page = await context.newPage();
      page.setDefaultTimeout(msg.action_timeout_ms);
      page.setDefaultNavigationTimeout(msg.navigation_timeout_ms);
      baseUrl = msg.base_url;
      return {};
    }
    case 'goto':
      await page.goto(baseUrl, { waitUntil: 'networkidle' });
      return {};
    case 'fill':
      await resolve(msg.locator).fill(msg.value);
      return {};
    case 'click':
      await resolve(msg.locator).click();
      return {};
    case 'press':
      if (msg.locator) await resolve(msg.locator).press(msg.key);
      else await page.keyboard.press(msg.key);
      return {};
    case 'set_checked':
      await resolve(msg.locator).setChecked(msg.checked);
      return {};
    case 'focus':
      await resolve(msg.locator).focus();
      return {};
    case 'is_visible': {
      const loc = resolve(msg.locator);
      const present = (await loc.count()) > 0;
      return { visible: present && (await loc.first().isVisible()) };
    }
    case 'text_of': {
      const loc = resolve(msg.locator);
      if ((await loc.count()) === 0) return { text: null };
      return { text: await loc.first().textContent() };
    }
    case 'count':
      return { count: await resolve(msg.locator).count() };
    case 'is_checked':
      return { checked: await resolve(msg.locator).isChecked() };
    case 'input_value':
      return { value: await resolve(msg.locator).inputValue() };
    case 'is_focused':
      return {
        focused: await resolve(msg.locator).evaluate((el) => el === document.activeElement),
      };
    case 'is_enabled':
      return { enabled: await resolve(msg.locator).isEnabled() };
    case 'text_decoration':
      return {
        text_decoration: await resolve(msg.locator).evaluate(
          (el) => window.getComputedStyle(el).textDecoration
        ),
      };
    case 'item_texts': {
      // Item text excludes the text of embedded controls
      const texts = await resolve(msg.locator).evaluateAll((els) =>
        els.map((el) => {
          const clone = el.cloneNode(true);
          clone.querySelectorAll('button, input').forEach((n) => n.remove());
          return (clone.textContent || '').trim();
        })
      );
      return { texts };
    }
    case 'screenshot':
      await page.screenshot({ path: msg.path, fullPage: true });
      return {};
    case 'trace_stop':
      if (tracing) {
        await context.tracing.stop({ path: msg.path });
        tracing = false;
      }
      return {};
    case 'close': {
      let videoPath = null;
      if (page) {
        const video = page.video();
        if (video) videoPath = await video.path();
      }
      if (context) await context.close();
      if (browser) await browser.close();
      return { video_path: videoPath };
    }
    default:
      throw new Error('unknown command: ' + msg.cmd);
  }
}

const rl = readline.createInterface({ input: process.stdin });
const queue = [];
let busy = false;

async function pump() {
  if (busy) return;
  busy = true;
  while (queue.length > 0) {
    const line = queue.shift();
    let reply;
    let isClose = false;
    try {
      const msg = JSON.parse(line);
      isClose = msg.cmd === 'close';
      const data = await handle(msg);
      reply = { ok: true, data };
    } catch (err) {
      reply = { ok: false, error: String(err && err.message ? err.message : err) };
    }
    process.stdout.write(JSON.stringify(reply) + '\n');
    if (isClose) process.exit(reply.ok ? 0 : 1);
  }
  busy = false;
}

rl.on('line', (line) => {
  if (line.trim().length === 0) return;
  queue.push(line);
  pump();
});

rl.on('close', () => process.exit(0));

process.stdout.write(JSON.stringify({ ok: true, data: { ready: true } }) + '\n');
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_serialize_with_snake_case_tags() {
        let cmd = BridgeCommand::Fill {
            locator: LocatorSpec::Placeholder {
                placeholder: "Add a new todo".to_string(),
                nth: None,
            },
            value: "Test todo",
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert_eq!(
            json,
            r#"{"cmd":"fill","locator":{"by":"placeholder","placeholder":"Add a new todo"},"value":"Test todo"}"#
        );
    }

    #[test]
    fn optional_locator_fields_are_omitted() {
        let cmd = BridgeCommand::Count {
            locator: LocatorSpec::Role { role: "checkbox", name: None, nth: None },
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert_eq!(json, r#"{"cmd":"count","locator":{"by":"role","role":"checkbox"}}"#);
    }

    #[test]
    fn replies_deserialize_with_defaults() {
        let reply: BridgeReply = serde_json::from_str(r#"{"ok":true,"data":{"count":3}}"#).unwrap();
        assert!(reply.ok);
        assert!(reply.error.is_none());
        assert_eq!(reply.data.get("count").and_then(|v| v.as_u64()), Some(3));

        let reply: BridgeReply =
            serde_json::from_str(r#"{"ok":false,"error":"no such element"}"#).unwrap();
        assert!(!reply.ok);
        assert_eq!(reply.error.as_deref(), Some("no such element"));
    }

    #[test]
    fn sidecar_script_speaks_the_same_protocol() {
        // Every command tag the Rust side can emit must be handled by the
        // embedded script.
        for tag in [
            "open", "goto", "fill", "click", "press", "set_checked", "focus", "is_visible",
            "text_of", "count", "is_checked", "input_value", "is_focused", "is_enabled",
            "text_decoration", "item_texts", "screenshot", "trace_stop", "close",
        ] {
            assert!(
                BRIDGE_SCRIPT.contains(&format!("case '{}'", tag)),
                "sidecar script does not handle '{}'",
                tag
            );
        }
    }
}
