//! Supervised service status.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;

/// Reports the status line of a supervised program.
#[async_trait]
pub trait ServiceMonitor: Send + Sync {
    async fn status(&self, service: &str) -> anyhow::Result<String>;
}

/// Runs `supervisorctl status <service>`.
#[derive(Debug, Clone)]
pub struct Supervisorctl {
    timeout: Duration,
}

impl Supervisorctl {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ServiceMonitor for Supervisorctl {
    async fn status(&self, service: &str) -> anyhow::Result<String> {
        let output = tokio::time::timeout(
            self.timeout,
            Command::new("supervisorctl")
                .arg("status")
                .arg(service)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .context("supervisorctl timed out")?
        .context("failed to run supervisorctl")?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
