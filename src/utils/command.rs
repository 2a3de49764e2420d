use crate::error::Result;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Runs an external helper and returns its stdout.
///
/// A non-zero exit status is an error; stderr is folded into the message.
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[&str]) -> Result<String>;
}

pub struct SystemCommandRunner {
    timeout: Duration,
}

impl SystemCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait::async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        debug!(program, ?args, "running helper");

        let output = crate::utils::with_deadline(
            self.timeout,
            &format!("failed to execute {program}"),
            Command::new(program).args(args).kill_on_drop(true).output(),
        )
        .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(program, status = %output.status, stderr = %stderr.trim(), "helper failed");
            return Err(crate::yawi_error!(
                protocol,
                "{program} exited with {}: {}",
                output.status,
                stderr.trim()
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
