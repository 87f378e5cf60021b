//! GitHub hosting platform driven through the `gh` CLI.
use async_trait::async_trait;
use log::*;
use serde_json::Deserializer;
use std::{path::PathBuf, sync::Arc};

use crate::{
    error::{RehearsalError, Result},
    host::{
        HostingPlatform,
        types::{CreatePrRequest, MergePrRequest, PullRequest, Release, RepoId},
    },
    process::{CommandRunner, Invocation, run_checked},
};

const GH: &str = "gh";

/// [`HostingPlatform`] backed by the GitHub CLI.
pub struct GhCli {
    runner: Arc<dyn CommandRunner>,
    /// Directory `gh` runs in so it resolves the repository from the
    /// local checkout.
    workdir: Option<PathBuf>,
}

impl GhCli {
    /// Create a client.
    ///
    /// # Arguments
    ///
    /// * `runner` - Runs the `gh` processes
    /// * `workdir` - Directory `gh` runs in, `None` for the current directory
    pub fn new(runner: Arc<dyn CommandRunner>, workdir: Option<PathBuf>) -> Self {
        Self { runner, workdir }
    }

    fn gh(&self) -> Invocation {
        let invocation = Invocation::new(GH);
        match &self.workdir {
            Some(dir) => invocation.current_dir(dir),
            None => invocation,
        }
    }
}

/// Parse the PR number from the URL printed by `gh pr create`, e.g.
/// `https://github.com/owner/repo/pull/42`.
///
/// Returns `None` when no line is a URL ending in a number.
pub fn parse_pr_url(stdout: &str) -> Option<PullRequest> {
    let url = stdout
        .lines()
        .map(str::trim)
        .rfind(|line| line.starts_with("http"))?;

    let number = url.trim_end_matches('/').rsplit('/').next()?.parse().ok()?;

    Some(PullRequest {
        number,
        url: url.to_string(),
    })
}

/// Parse the output of a paginated releases listing. `gh api --paginate`
/// prints one JSON array per page back to back, so the output is read as a
/// stream of arrays.
///
/// # Errors
///
/// Returns `JsonParseError` when any page is not an array of releases.
pub fn parse_releases(stdout: &str) -> Result<Vec<Release>> {
    let mut releases = vec![];

    for page in Deserializer::from_str(stdout).into_iter::<Vec<Release>>() {
        releases.extend(page?);
    }

    Ok(releases)
}

#[async_trait]
impl HostingPlatform for GhCli {
    fn tool(&self) -> &'static str {
        GH
    }

    /// A missing `gh` binary is reported as `Ok(false)`, not an error.
    async fn is_installed(&self) -> Result<bool> {
        match self.runner.run(self.gh().arg("--version")).await {
            Ok(output) => {
                if let Some(version) = output.stdout.lines().next() {
                    debug!("{}", version.trim());
                }
                Ok(output.is_success())
            }
            Err(RehearsalError::ToolNotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn is_authenticated(&self) -> Result<bool> {
        let output = self.runner.run(self.gh().args(["auth", "status"])).await?;

        if !output.is_success() {
            debug!("gh auth status: {}", output.stderr.trim());
        }

        Ok(output.is_success())
    }

    /// Open a pull request and parse its URL from `gh pr create` output.
    ///
    /// # Arguments
    ///
    /// * `req` - Head and base branches, title and body
    ///
    /// # Errors
    ///
    /// Returns `CommandFailed` when `gh` exits non-zero and
    /// `UnexpectedOutput` when no pull request URL is printed.
    async fn create_pr(&self, req: CreatePrRequest) -> Result<PullRequest> {
        info!("creating pull request {} -> {}", req.head_branch, req.base_branch);

        let invocation = self.gh().args([
            "pr",
            "create",
            "--base",
            req.base_branch.as_str(),
            "--head",
            req.head_branch.as_str(),
            "--title",
            req.title.as_str(),
            "--body",
            req.body.as_str(),
        ]);

        let output = run_checked(self.runner.as_ref(), invocation.clone()).await?;

        let pr = parse_pr_url(&output.stdout).ok_or_else(|| {
            RehearsalError::UnexpectedOutput {
                command: invocation.to_string(),
                output: output.stdout.trim().to_string(),
            }
        })?;

        info!("created pull request #{}: {}", pr.number, pr.url);

        Ok(pr)
    }

    /// Merge with a merge commit, optionally deleting the source branch.
    ///
    /// # Errors
    ///
    /// Returns `CommandFailed` when the merge is refused.
    async fn merge_pr(&self, req: MergePrRequest) -> Result<()> {
        info!("merging pull request {}", req.pr);

        let mut invocation =
            self.gh().args(["pr", "merge", req.pr.as_str(), "--merge"]);

        if req.delete_branch {
            invocation = invocation.arg("--delete-branch");
        }

        run_checked(self.runner.as_ref(), invocation).await?;

        Ok(())
    }

    /// List every release of `repo` across all pages.
    ///
    /// # Arguments
    ///
    /// * `repo` - Repository to list releases for
    ///
    /// # Errors
    ///
    /// Returns `CommandFailed` when the API call fails and `JsonParseError`
    /// when the response cannot be parsed.
    async fn list_releases(&self, repo: &RepoId) -> Result<Vec<Release>> {
        let invocation = self.gh().args([
            "api".to_string(),
            repo.releases_path(),
            "--paginate".to_string(),
        ]);

        let output = run_checked(self.runner.as_ref(), invocation).await?;
        let releases = parse_releases(&output.stdout)?;

        debug!("found {} releases for {repo}", releases.len());

        Ok(releases)
    }

    /// Delete one release by id. The tag it points at is left in place.
    ///
    /// # Errors
    ///
    /// Returns `CommandFailed` when the API call fails, including a 404 for
    /// an unknown id.
    async fn delete_release(&self, repo: &RepoId, id: u64) -> Result<()> {
        let invocation = self.gh().args([
            "api".to_string(),
            "-X".to_string(),
            "DELETE".to_string(),
            format!("{}/{id}", repo.releases_path()),
        ]);

        run_checked(self.runner.as_ref(), invocation).await?;

        Ok(())
    }
}
