//! Error types for release-rehearsal.
use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// Main error type for rehearsal operations.
#[derive(Error, Debug)]
pub enum RehearsalError {
    // Cli args errors
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error(
        "Invalid repository identifier '{0}': expected the form owner/name"
    )]
    InvalidRepo(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Precondition errors
    #[error("{tool} is not installed or not found on PATH")]
    ToolNotFound { tool: String },

    #[error("GitHub CLI is not authenticated, run `gh auth login`: {0}")]
    NotAuthenticated(String),

    #[error(
        "Working tree has uncommitted changes: commit or stash them before running"
    )]
    DirtyWorkingTree,

    #[error("Expected file not found: {}", .0.display())]
    MissingFile(PathBuf),

    // External command errors
    #[error("`{command}` exited with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("Unexpected output from `{command}`: {output}")]
    UnexpectedOutput { command: String, output: String },

    /// Labels the procedure step a failure occurred in.
    #[error("{step}: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: Box<RehearsalError>,
    },

    #[error("Timed out after {0:?} waiting for a new tag to appear")]
    SettleTimeout(Duration),

    #[error("Aborted: {0}")]
    Aborted(String),

    #[error("Git operation failed: {0}")]
    GitError(#[from] git2::Error),

    #[error("JSON parse error: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] log::SetLoggerError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias using RehearsalError
pub type Result<T> = std::result::Result<T, RehearsalError>;

impl RehearsalError {
    /// Create an invalid arguments error
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArgs(msg.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a tool not found error
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Label this error with the step it occurred in.
    pub fn in_step(self, step: &'static str) -> Self {
        Self::Step {
            step,
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, looking through step labels.
    pub fn root(&self) -> &RehearsalError {
        match self {
            Self::Step { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Attach a step label to a fallible result.
pub trait StepExt<T> {
    fn step(self, step: &'static str) -> Result<T>;
}

impl<T> StepExt<T> for Result<T> {
    fn step(self, step: &'static str) -> Result<T> {
        self.map_err(|err| err.in_step(step))
    }
}
