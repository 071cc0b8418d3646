use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("tool output was not valid UTF-8")]
    NotUtf8,
}

/// Runs the external gh CLI and returns its stdout.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, args: &[&str]) -> Result<Vec<u8>, ToolError>;
}

/// `ToolRunner` that spawns a gh binary.
pub struct GhCli {
    program: PathBuf,
}

impl GhCli {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }

    /// Ask gh for the token it is logged in with.
    pub async fn auth_token(&self) -> Result<String, ToolError> {
        let stdout = self.run(&["auth", "token"]).await?;
        let token = String::from_utf8(stdout).map_err(|_| ToolError::NotUtf8)?;
        Ok(token.trim().to_string())
    }
}

#[async_trait]
impl ToolRunner for GhCli {
    #[instrument(skip(self), fields(program = %self.program.display()))]
    async fn run(&self, args: &[&str]) -> Result<Vec<u8>, ToolError> {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|source| ToolError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                command: format!("{} {}", self.program.display(), args.join(" ")),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!(bytes = output.stdout.len(), "tool finished");
        Ok(output.stdout)
    }
}
