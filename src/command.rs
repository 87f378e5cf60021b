//! Procedure execution for release-rehearsal.
//!
//! Two procedures are available:
//!
//! - **open_pr**: branch off the default branch, append a timestamp marker,
//!   commit, push, open and merge a pull request, wait for downstream
//!   release automation, then re-sync the local default branch.
//! - **cleanup**: delete every release of a repository, then every tag
//!   locally and on the remote.
//!
//! Both run the checks in [`preflight`] before touching anything.

/// Delete all releases, then all tags.
pub mod cleanup;

/// Automated pull request cycle.
pub mod open_pr;

/// Tool availability, authentication and working tree checks.
pub mod preflight;

use log::*;
use std::{env, sync::Arc};

use crate::{
    cli,
    config::Config,
    error::Result,
    host::{HostingPlatform, github::GhCli, types::RepoId},
    process::{CommandRunner, SystemRunner},
    timestamp::{Clock, SystemClock},
    vcs::{
        VersionControl,
        git::{Git, discover_workdir},
    },
};

/// External collaborators a procedure drives.
pub struct Tools {
    pub vcs: Box<dyn VersionControl>,
    pub host: Box<dyn HostingPlatform>,
    pub clock: Box<dyn Clock>,
}

/// Resolve configuration for the repository in the current directory and
/// run the selected subcommand.
pub async fn run(args: cli::Args) -> Result<()> {
    let root = discover_workdir(&env::current_dir()?)?;
    let mut config = Config::load(args.config.as_deref(), &root)?;

    match &args.command {
        cli::Command::OpenPr(open_pr_args) => open_pr_args.apply(&mut config),
        cli::Command::Cleanup(cleanup_args) => cleanup_args.apply(&mut config),
    }
    config.validate()?;

    debug!("resolved configuration: {config:?}");

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
    let tools = Tools {
        vcs: Box::new(Git::open(&root, config.remote.clone(), runner.clone())?),
        host: Box::new(GhCli::new(runner, Some(root))),
        clock: Box::new(SystemClock),
    };

    match args.command {
        cli::Command::OpenPr(open_pr_args) => {
            let outcome =
                open_pr::execute(&tools, &config, &open_pr_args.message).await?;

            info!(
                "merged pull request #{} from {}",
                outcome.pull_request.number, outcome.branch
            );
            if let Some(tag) = outcome.new_tag {
                info!("release automation created tag {tag}");
            }
        }
        cli::Command::Cleanup(cleanup_args) => {
            let options = cleanup_args.options();
            let skip_prompt = |_: &RepoId| -> Result<()> { Ok(()) };

            let confirm: cleanup::Confirm<'_> = if cleanup_args.yes {
                &skip_prompt
            } else {
                &cli::confirm_cleanup_interactive
            };

            let report =
                cleanup::execute(&tools, &cleanup_args.repo, options, confirm)
                    .await?;

            if report.dry_run {
                warn!(
                    "dry_run: {} releases and {} tags left untouched",
                    report.releases.len(),
                    report.tags.len()
                );
            } else {
                info!(
                    "removed {} releases and {} tags from {}",
                    report.releases.len(),
                    report.tags.len(),
                    cleanup_args.repo
                );
            }
        }
    }

    Ok(())
}
