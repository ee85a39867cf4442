//! External tool execution
//!
//! Every collaborator tool (`security`, `openssl`, `assettool`) is invoked
//! through a [`ToolCommand`]: a program plus an argv vector, spawned directly
//! with `tokio::process::Command`. No shell is involved, so certificate file
//! names with spaces or quotes are passed through untouched.
//!
//! The [`ToolRunner`] trait is the seam the pipeline components depend on;
//! [`SystemToolRunner`] is the real implementation.

use crate::{PipelineError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command as TokioCommand;
use tracing::debug;

/// A single external tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Program to execute (absolute path or looked up in PATH)
    pub program: PathBuf,
    /// Arguments passed verbatim
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new<P: AsRef<Path>>(program: P) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a path argument
    pub fn path_arg<P: AsRef<Path>>(self, path: P) -> Self {
        let rendered = path.as_ref().to_string_lossy().into_owned();
        self.arg(rendered)
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The subcommand, i.e. the first argument
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Shell-quoted rendering, for diagnostics only
    pub fn display(&self) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(self.program.to_string_lossy().into_owned());
        words.extend(self.args.iter().cloned());
        shell_words::join(words)
    }

    /// Build the `ExternalTool` error for this command
    pub fn failure(&self, reason: impl Into<String>) -> PipelineError {
        PipelineError::ExternalTool {
            command: self.display(),
            reason: reason.into(),
        }
    }
}

/// Captured result of a finished tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code; `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Short description of a failed run for error messages
    pub fn describe_failure(&self) -> String {
        let status = match self.exit_code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        };
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            status
        } else {
            format!("{status}: {stderr}")
        }
    }
}

/// Runs external tools on behalf of the pipeline
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run the command to completion and capture its output.
    ///
    /// A non-zero exit status is NOT an error at this level; callers decide
    /// which statuses are acceptable. Errors are reserved for failing to
    /// spawn, wait on, or time out the process.
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput>;

    /// Run and require exit status 0
    async fn run_checked(&self, command: &ToolCommand) -> Result<ToolOutput> {
        let output = self.run(command).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(command.failure(output.describe_failure()))
        }
    }
}

/// Spawns real processes with a per-call timeout
pub struct SystemToolRunner {
    timeout: Duration,
}

impl SystemToolRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl ToolRunner for SystemToolRunner {
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        debug!("Running: {}", command.display());

        let mut process = TokioCommand::new(&command.program);
        process
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = process
            .spawn()
            .map_err(|e| command.failure(format!("failed to spawn: {e}")))?;

        // Dropping the timed-out future drops the child, which kills it
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| command.failure(format!("timed out after {:?}", self.timeout)))?
            .map_err(|e| command.failure(format!("failed to wait for output: {e}")))?;

        let result = ToolOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(
            "{} finished with {:?}",
            command.program.display(),
            result.exit_code
        );
        Ok(result)
    }
}
