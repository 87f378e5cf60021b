//! External command execution.
//!
//! Every call to `git` or `gh` goes through a [`CommandRunner`] so the
//! clients built on top of it can be exercised in tests without spawning
//! real processes.
use async_trait::async_trait;
use log::*;
use std::{fmt, io::ErrorKind, path::PathBuf};
use tokio::process::Command;

#[cfg(test)]
use mockall::automock;

use crate::error::{RehearsalError, Result};

/// A single external command: program, arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: vec![],
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in self.args.iter() {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[cfg(test)]
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: "".into(),
        }
    }

    #[cfg(test)]
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stdout: "".into(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }

    /// Converts a non-zero exit into [`RehearsalError::CommandFailed`].
    pub fn ensure_success(self, invocation: &Invocation) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }

        Err(RehearsalError::CommandFailed {
            command: invocation.to_string(),
            status: self.status.unwrap_or(-1),
            stderr: self.stderr.trim().to_string(),
        })
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion and capture its output. A non-zero
    /// exit is not an error at this level.
    async fn run(&self, invocation: Invocation) -> Result<CommandOutput>;
}

/// Runs a command and fails on a non-zero exit.
pub async fn run_checked(
    runner: &dyn CommandRunner,
    invocation: Invocation,
) -> Result<CommandOutput> {
    let output = runner.run(invocation.clone()).await?;
    output.ensure_success(&invocation)
}

/// [`CommandRunner`] backed by real child processes.
#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: Invocation) -> Result<CommandOutput> {
        debug!("running: {invocation}");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).kill_on_drop(true);

        if let Some(cwd) = &invocation.cwd {
            cmd.current_dir(cwd);
        }

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(RehearsalError::tool_not_found(
                    invocation.program.clone(),
                ));
            }
            Err(err) => return Err(err.into()),
        };

        let output = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !output.is_success() {
            debug!(
                "command exited with status {:?}: {}",
                output.status,
                output.stderr.trim()
            );
        }

        Ok(output)
    }
}
