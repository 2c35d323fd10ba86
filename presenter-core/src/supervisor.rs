//! C9 Process Supervisor: optional launcher for the Presenter process on
//! the same host. Pure supervisory code — no business logic (spec §4.9).

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::client::PresenterClient;

#[derive(Debug, Clone, Serialize)]
pub struct LaunchOutcome {
    pub launched: bool,
    pub ready: bool,
    pub error: Option<String>,
}

/// Checks whether a process named `process_name` is present on the host.
/// Platform-appropriate: shells out to `pgrep` on unix, `tasklist` on
/// windows — there is no portable stdlib way to enumerate processes.
pub fn is_running(process_name: &str) -> bool {
    #[cfg(unix)]
    {
        std::process::Command::new("pgrep")
            .arg("-x")
            .arg(process_name)
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }
    #[cfg(windows)]
    {
        std::process::Command::new("tasklist")
            .arg("/FI")
            .arg(format!("IMAGENAME eq {process_name}.exe"))
            .output()
            .map(|out| String::from_utf8_lossy(&out.stdout).contains(process_name))
            .unwrap_or(false)
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = process_name;
        false
    }
}

/// Launches `binary_path` (detached) if `process_name` isn't already
/// running, then polls `Version()` on `client` until it answers or
/// `timeout` elapses.
pub async fn launch_and_wait(
    process_name: &str,
    binary_path: &str,
    client: &PresenterClient,
    timeout: Duration,
) -> LaunchOutcome {
    let mut launched = false;

    if !is_running(process_name) {
        match std::process::Command::new(binary_path).spawn() {
            Ok(_child) => launched = true,
            Err(err) => {
                return LaunchOutcome { launched: false, ready: false, error: Some(err.to_string()) };
            }
        }
    }

    let deadline = Instant::now() + timeout;
    loop {
        if client.version().await.is_ok() {
            return LaunchOutcome { launched, ready: true, error: None };
        }
        if Instant::now() >= deadline {
            return LaunchOutcome { launched, ready: false, error: Some("timed out waiting for presenter to become ready".to_string()) };
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}
