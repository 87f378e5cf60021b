//! Version-control client used by both procedures.

/// Local git repository implementation.
pub mod git;

use async_trait::async_trait;
use std::path::PathBuf;

#[cfg(test)]
use mockall::automock;

use crate::error::Result;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Root of the working tree.
    fn workdir(&self) -> PathBuf;
    /// True when the `git` CLI used for remote operations can be spawned.
    async fn is_available(&self) -> Result<bool>;
    /// True when there are no staged, unstaged or untracked changes.
    async fn is_clean(&self) -> Result<bool>;
    /// Switch to an existing local branch.
    async fn checkout(&self, branch: &str) -> Result<()>;
    /// Pull `branch` from the configured remote into the current branch.
    async fn pull(&self, branch: &str) -> Result<()>;
    /// Create a branch at HEAD and switch to it.
    async fn create_branch(&self, branch: &str) -> Result<()>;
    /// Stage every change in the working tree.
    async fn add_all(&self) -> Result<()>;
    async fn commit(&self, message: &str) -> Result<()>;
    /// Push `branch` to the remote and set it as upstream.
    async fn push_branch(&self, branch: &str) -> Result<()>;
    /// Fetch all remotes including tags.
    async fn fetch_all(&self) -> Result<()>;
    async fn list_tags(&self) -> Result<Vec<String>>;
    async fn delete_local_tags(&self, tags: Vec<String>) -> Result<()>;
    async fn delete_remote_tags(&self, tags: Vec<String>) -> Result<()>;
}
