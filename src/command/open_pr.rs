//! Open, merge and re-sync an automated pull request.
//!
//! Every external step is checked as soon as it returns. The first failure
//! aborts the run with the step's label and nothing is rolled back: a branch
//! or pull request created before the failure is left for manual cleanup.
use log::*;

use crate::{
    command::{Tools, preflight},
    config::Config,
    error::{RehearsalError, Result, StepExt},
    host::types::{CreatePrRequest, MergePrRequest, PullRequest},
    marker::append_marker,
    timestamp::{branch_name, marker_line},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPrOutcome {
    pub branch: String,
    pub pull_request: PullRequest,
    /// Tag observed while settling, only set when polling for tags.
    pub new_tag: Option<String>,
}

/// Commit messages double as the PR title so they must not be blank.
pub fn validate_message(message: &str) -> Result<()> {
    if message.trim().is_empty() {
        return Err(RehearsalError::invalid_args(
            "commit message must not be empty",
        ));
    }
    Ok(())
}

/// Execute the open-pr procedure with `message` as commit message and PR
/// title.
pub async fn execute(
    tools: &Tools,
    config: &Config,
    message: &str,
) -> Result<OpenPrOutcome> {
    validate_message(message)?;
    let strategy = config.settle.strategy()?;

    let vcs = tools.vcs.as_ref();
    let host = tools.host.as_ref();
    let base = config.default_branch.as_str();

    preflight::check_host(host).await?;
    preflight::check_vcs(vcs).await?;
    preflight::check_clean_tree(vcs).await?;

    vcs.checkout(base)
        .await
        .step("Failed to checkout default branch")?;
    vcs.pull(base).await.step("Failed to pull latest changes")?;

    let now = tools.clock.now();
    let branch = branch_name(&config.branch_prefix, now);

    vcs.create_branch(&branch)
        .await
        .step("Failed to create new branch")?;

    let marker_path = vcs.workdir().join(&config.marker_file);
    append_marker(&marker_path, &marker_line(now))
        .await
        .step("Failed to append marker to configuration file")?;

    vcs.add_all().await.step("Failed to stage changes")?;
    vcs.commit(message).await.step("Failed to commit changes")?;
    vcs.push_branch(&branch).await.step("Failed to push branch")?;

    let baseline = strategy
        .baseline(vcs)
        .await
        .step("Failed to record existing tags")?;

    let pull_request = host
        .create_pr(CreatePrRequest {
            head_branch: branch.clone(),
            base_branch: base.to_string(),
            title: message.to_string(),
            body: config.pr_body.clone(),
        })
        .await
        .step("Failed to create pull request")?;

    host.merge_pr(MergePrRequest {
        pr: pull_request.url.clone(),
        delete_branch: true,
    })
    .await
    .step("Failed to merge pull request")?;

    info!("pull request #{} merged", pull_request.number);

    let new_tag = strategy
        .wait(vcs, &baseline)
        .await
        .step("Failed waiting for downstream automation")?;

    vcs.checkout(base)
        .await
        .step("Failed to checkout default branch after merge")?;
    vcs.fetch_all().await.step("Failed to fetch remote updates")?;
    vcs.pull(base)
        .await
        .step("Failed to pull latest changes after merge")?;

    info!("{base} is up to date with {}", config.remote);

    Ok(OpenPrOutcome {
        branch,
        pull_request,
        new_tag,
    })
}
