//! CLI argument parsing and cleanup confirmation.
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::{
    io::{self, BufRead, IsTerminal, Write},
    path::PathBuf,
};

use crate::{
    command::cleanup::CleanupOptions,
    config::{Config, SettleMode},
    error::{RehearsalError, Result},
    host::types::RepoId,
};

/// Rehearse release automation against a throwaway repository.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, default_value_t = false, global = true)]
    /// Enable debug logging.
    pub debug: bool,

    #[arg(long, global = true)]
    /// Configuration file. Defaults to rehearsal.toml in the repository root.
    pub config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Commit a timestamp marker, open and merge a pull request, then wait
    /// for release automation.
    OpenPr(OpenPrArgs),

    /// Delete every release and tag of a repository.
    Cleanup(CleanupArgs),
}

#[derive(ClapArgs, Debug)]
pub struct OpenPrArgs {
    /// Commit message, also used as the pull request title.
    pub message: String,

    #[arg(long)]
    /// Branch to start from and merge into.
    pub base: Option<String>,

    #[arg(long)]
    /// Git remote to pull from and push to.
    pub remote: Option<String>,

    #[arg(long)]
    /// Prefix of the generated branch name.
    pub branch_prefix: Option<String>,

    #[arg(long)]
    /// File receiving the marker line, relative to the repository root.
    pub marker_file: Option<PathBuf>,

    #[arg(long, value_name = "SECS", conflicts_with = "wait_for_tag")]
    /// Seconds to wait after merging.
    pub delay: Option<u64>,

    #[arg(long, default_value_t = false)]
    /// Poll for a new tag after merging instead of sleeping.
    pub wait_for_tag: bool,

    #[arg(long, value_name = "SECS")]
    /// Seconds between tag polls.
    pub poll_interval: Option<u64>,

    #[arg(long, value_name = "SECS")]
    /// Give up polling for a tag after this many seconds.
    pub poll_timeout: Option<u64>,
}

impl OpenPrArgs {
    /// Overlay flags given on the command line onto `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(base) = &self.base {
            config.default_branch = base.clone();
        }
        if let Some(remote) = &self.remote {
            config.remote = remote.clone();
        }
        if let Some(prefix) = &self.branch_prefix {
            config.branch_prefix = prefix.clone();
        }
        if let Some(marker_file) = &self.marker_file {
            config.marker_file = marker_file.clone();
        }
        if let Some(delay) = self.delay {
            config.settle.mode = SettleMode::Delay;
            config.settle.delay_secs = delay;
        }
        if self.wait_for_tag {
            config.settle.mode = SettleMode::PollTags;
        }
        if let Some(interval) = self.poll_interval {
            config.settle.poll_interval_secs = interval;
        }
        if let Some(timeout) = self.poll_timeout {
            config.settle.poll_timeout_secs = timeout;
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct CleanupArgs {
    /// Repository in owner/name form.
    pub repo: RepoId,

    #[arg(long)]
    /// Git remote to delete tags from.
    pub remote: Option<String>,

    #[arg(long, default_value_t = false)]
    /// List what would be deleted without deleting anything.
    pub dry_run: bool,

    #[arg(long, short = 'y', default_value_t = false)]
    /// Skip the confirmation prompt.
    pub yes: bool,
}

impl CleanupArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(remote) = &self.remote {
            config.remote = remote.clone();
        }
    }

    pub fn options(&self) -> CleanupOptions {
        CleanupOptions {
            dry_run: self.dry_run,
        }
    }
}

/// Process exit status for a failed parse.
///
/// Usage errors exit with 1 rather than clap's default 2. Help and version
/// output are reported by clap as errors too and exit with 0.
pub fn exit_code_for(err: &clap::Error) -> u8 {
    if err.use_stderr() { 1 } else { 0 }
}

/// Ask the operator to type `repo` before anything is deleted.
pub fn confirm_cleanup<R: BufRead, W: Write>(
    repo: &RepoId,
    mut input: R,
    mut output: W,
) -> Result<()> {
    write!(
        output,
        "This deletes every release and tag of {repo}. Type {repo} to confirm: "
    )?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    if answer.trim() != repo.to_string() {
        return Err(RehearsalError::Aborted(format!(
            "confirmation did not match {repo}"
        )));
    }

    Ok(())
}

/// Prompt on the terminal. Without one, `--yes` is required.
pub fn confirm_cleanup_interactive(repo: &RepoId) -> Result<()> {
    let stdin = io::stdin();

    if !stdin.is_terminal() {
        return Err(RehearsalError::Aborted(
            "stdin is not a terminal, pass --yes to confirm cleanup".into(),
        ));
    }

    confirm_cleanup(repo, stdin.lock(), io::stderr())
}
