//! Child process execution.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::BootstrapError;

/// A command line to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub envs: Vec<(String, String)>,
    /// Deadline for captured runs.
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: &str, cwd: &Path) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
            envs: Vec::new(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn envs(mut self, envs: &[(String, String)]) -> Self {
        self.envs.extend_from_slice(envs);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// `program arg1 arg2`, for log lines.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Exit status and captured streams of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout followed by stderr.
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// Runs child processes.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run to completion with stdout and stderr captured.
    async fn output(&self, spec: &CommandSpec) -> Result<CommandOutput, BootstrapError>;

    /// Run to completion with stdio inherited from this process. Returns the exit code.
    async fn run_inherited(&self, spec: &CommandSpec) -> Result<Option<i32>, BootstrapError>;
}

/// [`ProcessRunner`] backed by `tokio::process`.
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    fn command(spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).current_dir(&spec.cwd);
        for (key, val) in &spec.envs {
            cmd.env(key, val);
        }
        cmd
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn output(&self, spec: &CommandSpec) -> Result<CommandOutput, BootstrapError> {
        let mut cmd = Self::command(spec);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let spawn_err = |source| BootstrapError::Spawn {
            program: spec.program.clone(),
            source,
        };

        let output = match spec.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| BootstrapError::TimedOut {
                    program: spec.program.clone(),
                    secs: limit.as_secs(),
                })?
                .map_err(spawn_err)?,
            None => cmd.output().await.map_err(spawn_err)?,
        };

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn run_inherited(&self, spec: &CommandSpec) -> Result<Option<i32>, BootstrapError> {
        let mut cmd = Self::command(spec);
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let status = cmd.status().await.map_err(|source| BootstrapError::Spawn {
            program: spec.program.clone(),
            source,
        })?;
        Ok(status.code())
    }
}
