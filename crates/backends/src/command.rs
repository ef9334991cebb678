//! Command construction and execution with a uniform dry-run contract.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::debug;

/// Whether an operation should execute or only report what it would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DryRun {
    /// Report the command without executing it.
    Yes,
    /// Execute for real.
    No,
}

impl DryRun {
    /// Whether this is a dry run.
    #[must_use]
    pub const fn is_dry(self) -> bool {
        matches!(self, Self::Yes)
    }
}

impl From<bool> for DryRun {
    fn from(dry: bool) -> Self {
        if dry { Self::Yes } else { Self::No }
    }
}

/// The outcome of one backend command, real or dry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    /// The exact argv, program first.
    pub command: Vec<String>,
    /// Process exit code (0 for dry runs).
    pub return_code: i32,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
    /// Wall-clock execution time (zero for dry runs).
    pub duration: Duration,
    /// Whether the command was actually executed.
    pub dry_run: bool,
}

impl CommandResult {
    /// Whether the operation succeeded. Dry runs always succeed: the
    /// point of a dry run is to traverse the whole pipeline.
    #[must_use]
    pub const fn ok(&self) -> bool {
        self.return_code == 0 || self.dry_run
    }

    /// The command as a display string.
    #[must_use]
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }

    /// Converts a failed result into an error, passing successes through.
    pub fn into_result(self) -> Result<Self> {
        if self.ok() {
            Ok(self)
        } else {
            Err(Error::CommandFailed {
                command: self.command_line(),
                return_code: self.return_code,
                stderr: self.stderr,
            })
        }
    }
}

/// A command built once and then either executed or reported.
///
/// The argv is assembled a single time, so the dry-run report and the
/// real execution can never drift apart.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl CommandSpec {
    /// Starts building a command.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            envs: Vec::new(),
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Sets one environment variable for the child.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// The full argv, program first.
    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Runs the command, or reports it when `dry_run` is set.
    pub async fn run(&self, dry_run: DryRun) -> Result<CommandResult> {
        let argv = self.argv();

        if dry_run.is_dry() {
            debug!(command = %argv.join(" "), "dry run, not executing");
            return Ok(CommandResult {
                command: argv,
                return_code: 0,
                stdout: String::new(),
                stderr: String::new(),
                duration: Duration::ZERO,
                dry_run: true,
            });
        }

        debug!(command = %argv.join(" "), "executing");
        let start = Instant::now();
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| Error::spawn(argv.join(" "), e))?;

        Ok(CommandResult {
            command: argv,
            return_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration: start.elapsed(),
            dry_run: false,
        })
    }
}
