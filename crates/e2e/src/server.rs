//! Automation server management - readiness checks and optional spawning

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

use mobile_e2e_webdriver::{ServerStatus, WebDriverClient, WebDriverError};

use crate::config::SessionConfig;
use crate::error::{E2eError, E2eResult};

/// Handle to an automation server process started by the runner
pub struct ServerHandle {
    /// `None` once stopped
    child: Option<Child>,
    pub base_url: String,
}

impl ServerHandle {
    /// Spawn the server binary for `session`'s host, port and base path
    pub async fn spawn(binary_path: &Path, session: &SessionConfig, config: &ServerConfig) -> E2eResult<Self> {
        let base_url = session.base_url();
        info!("Spawning automation server {} at {}", binary_path.display(), base_url);

        let mut cmd = Command::new(binary_path);
        cmd.arg("--address")
            .arg(&session.host)
            .arg("--port")
            .arg(session.port.to_string())
            .arg("--base-path")
            .arg(&session.path)
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().map_err(|e| {
            E2eError::ServerStartup(format!("Failed to spawn {}: {}", binary_path.display(), e))
        })?;

        let handle = ServerHandle {
            child: Some(child),
            base_url: base_url.clone(),
        };

        let client = WebDriverClient::new(base_url.as_str())?;
        wait_for_ready(&client, config).await?;

        Ok(handle)
    }

    /// Stop the server. Later calls do nothing.
    pub fn stop(&mut self) -> E2eResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        info!("Stopping automation server at {} (pid: {})", self.base_url, child.id());

        // Try graceful shutdown first
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        // Force kill if still running
        let _ = child.kill();
        child.wait()?;

        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Poll `GET /status` until the server reports ready
pub async fn wait_for_ready(client: &WebDriverClient, config: &ServerConfig) -> E2eResult<ServerStatus> {
    let start = Instant::now();
    let mut attempts = 0;

    while start.elapsed() < config.startup_timeout {
        attempts += 1;

        match client.status().await {
            Ok(status) if status.ready => {
                info!("Automation server is ready at {}", client.base_url());
                return Ok(status);
            }
            Ok(status) => {
                warn!("Automation server not ready yet: {}", status.message);
            }
            Err(WebDriverError::Http(e)) if e.is_connect() => {
                // Connection refused is expected while the server is starting
                if attempts == 1 {
                    info!("Waiting for automation server at {}...", client.base_url());
                }
            }
            Err(e) => {
                warn!("Status check error: {}", e);
            }
        }

        sleep(config.poll_interval).await;
    }

    Err(E2eError::ServerNotReady(attempts))
}

/// Configuration for reaching (and optionally starting) the server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server binary to spawn; `None` means an already running server
    pub binary_path: Option<PathBuf>,

    /// How long to wait for the server to report ready
    pub startup_timeout: Duration,

    /// Delay between status checks
    pub poll_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            startup_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(250),
        }
    }
}

impl ServerConfig {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            binary_path: lookup("APPIUM_BINARY")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            ..Self::default()
        }
    }
}
