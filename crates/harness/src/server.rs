//! Frontend lifecycle: reuse a running server or spawn one
//!
//! The harness needs the target reachable before any scenario runs. A server
//! that is already listening is reused untouched; otherwise, when spawning is
//! allowed, the configured command is started and polled until it serves
//! HTTP. Spawned servers are owned: stop() sends SIGTERM first and only then
//! kills.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{HarnessError, HarnessResult};

/// Configuration for reaching (or starting) the frontend.
#[derive(Debug, Clone)]
pub struct FrontendConfig {
    /// Where the surface should be served.
    pub base_url: String,

    /// Shell command that starts the frontend, e.g. `npm run dev`.
    pub command: Option<String>,

    /// Working directory for the command.
    pub working_dir: Option<PathBuf>,

    /// How long to wait for the spawned server to serve HTTP.
    pub startup_timeout: Duration,

    /// Whether spawning is permitted at all.
    pub allow_spawn: bool,
}

/// Handle to the frontend serving the target surface.
///
/// `child` is `None` when an already-running server was reused; reused
/// servers are never stopped by the harness.
#[derive(Debug)]
pub struct FrontendHandle {
    child: Option<Child>,
    pub base_url: String,
}

impl FrontendHandle {
    /// Make the target reachable, reusing or spawning as configured.
    pub async fn ensure(config: FrontendConfig) -> HarnessResult<Self> {
        if is_reachable(&config.base_url).await {
            info!("reusing running frontend at {}", config.base_url);
            return Ok(FrontendHandle { child: None, base_url: config.base_url });
        }

        if !config.allow_spawn {
            return Err(HarnessError::TargetUnreachable {
                url: config.base_url,
                reason: "not serving HTTP and server startup is disabled in automated runs"
                    .to_string(),
            });
        }

        let Some(command) = config.command.as_deref() else {
            return Err(HarnessError::TargetUnreachable {
                url: config.base_url,
                reason: "not serving HTTP and no frontend command configured".to_string(),
            });
        };

        info!(command, "starting frontend");

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        if let Some(dir) = &config.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            HarnessError::ServerStartup(format!("failed to spawn `{}`: {}", command, e))
        })?;

        let handle = FrontendHandle { child: Some(child), base_url: config.base_url };
        handle.wait_until_ready(config.startup_timeout).await?;

        info!("frontend ready at {}", handle.base_url);
        Ok(handle)
    }

    /// Poll the base URL until it serves a success response.
    async fn wait_until_ready(&self, timeout: Duration) -> HarnessResult<()> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout {
            attempts += 1;

            match client.get(&self.base_url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                Ok(resp) => {
                    warn!("readiness probe returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("waiting for frontend to start...");
                    }
                    // Connection refused is expected while the server boots
                    if !e.is_connect() {
                        warn!("readiness probe error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(250)).await;
        }

        Err(HarnessError::ServerReadiness(attempts))
    }

    /// Stop a spawned frontend; reused servers are left alone.
    pub async fn stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        if let Some(pid) = child.id() {
            info!("stopping frontend (pid: {})", pid);

            #[cfg(unix)]
            {
                use nix::sys::signal::{kill, Signal};
                use nix::unistd::Pid;

                if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok() {
                    // Give it a moment to shut down gracefully
                    sleep(Duration::from_millis(500)).await;
                }
            }
        }

        let _ = child.start_kill();
        let _ = child.wait().await;
    }
}

impl Drop for FrontendHandle {
    fn drop(&mut self) {
        // kill_on_drop covers the force-kill; send SIGTERM on a best-effort
        // basis so dev servers get to release their port.
        #[cfg(unix)]
        if let Some(child) = &self.child {
            if let Some(pid) = child.id() {
                use nix::sys::signal::{kill, Signal};
                use nix::unistd::Pid;
                let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            }
        }
    }
}

/// Whether the URL currently serves a success response.
pub async fn is_reachable(url: &str) -> bool {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
    {
        Ok(client) => client,
        Err(_) => return false,
    };

    matches!(client.get(url).send().await, Ok(resp) if resp.status().is_success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_target_without_spawning_is_an_environment_error() {
        let config = FrontendConfig {
            // Port 9 (discard) is not serving HTTP anywhere sane
            base_url: "http://127.0.0.1:9".to_string(),
            command: None,
            working_dir: None,
            startup_timeout: Duration::from_millis(200),
            allow_spawn: false,
        };

        let err = FrontendHandle::ensure(config).await.unwrap_err();
        assert!(matches!(err, HarnessError::TargetUnreachable { .. }));
    }

    #[tokio::test]
    async fn spawn_without_a_command_is_an_environment_error() {
        let config = FrontendConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            command: None,
            working_dir: None,
            startup_timeout: Duration::from_millis(200),
            allow_spawn: true,
        };

        let err = FrontendHandle::ensure(config).await.unwrap_err();
        assert!(err.to_string().contains("no frontend command"));
    }

    #[tokio::test]
    async fn command_that_never_serves_fails_readiness() {
        let config = FrontendConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            command: Some("sleep 30".to_string()),
            working_dir: None,
            startup_timeout: Duration::from_millis(600),
            allow_spawn: true,
        };

        let err = FrontendHandle::ensure(config).await.unwrap_err();
        assert!(matches!(err, HarnessError::ServerReadiness(_)));
    }
}
