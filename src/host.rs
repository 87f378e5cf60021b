//! Hosting platform abstraction (pull requests and releases).
//!
//! The only implementation drives the GitHub CLI, which owns authentication
//! for us: whatever `gh auth login` set up is what every call uses.

/// GitHub CLI implementation.
pub mod github;

/// Shared data types for pull requests, releases and repositories.
pub mod types;

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::{
    error::Result,
    host::types::{
        CreatePrRequest, MergePrRequest, PullRequest, Release, RepoId,
    },
};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait HostingPlatform: Send + Sync {
    /// Name of the CLI this platform is driven through, used in messages.
    fn tool(&self) -> &'static str;
    /// True when the CLI can be spawned and reports a version.
    async fn is_installed(&self) -> Result<bool>;
    /// True when the CLI has a valid login.
    async fn is_authenticated(&self) -> Result<bool>;
    async fn create_pr(&self, req: CreatePrRequest) -> Result<PullRequest>;
    async fn merge_pr(&self, req: MergePrRequest) -> Result<()>;
    async fn list_releases(&self, repo: &RepoId) -> Result<Vec<Release>>;
    async fn delete_release(&self, repo: &RepoId, id: u64) -> Result<()>;
}
