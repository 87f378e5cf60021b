//! Git repository operations.
//!
//! Local operations (status, branching, staging, committing and tag
//! bookkeeping) go through `git2`. Operations that talk to the remote shell
//! out to the `git` CLI so the user's credential helpers and ssh agent are
//! honoured exactly as they are for manual pushes.
use async_trait::async_trait;
use log::*;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::Mutex;

use crate::{
    error::{RehearsalError, Result},
    process::{CommandRunner, Invocation, run_checked},
    vcs::VersionControl,
};

/// Local repository handle plus the remote it syncs with.
pub struct Git {
    repo: Arc<Mutex<git2::Repository>>,
    runner: Arc<dyn CommandRunner>,
    remote: String,
    workdir: PathBuf,
}

/// Working tree root of the repository containing `path`.
///
/// # Arguments
///
/// * `path` - Any directory inside the repository
///
/// # Errors
///
/// Returns `GitError` when no repository is found and `InvalidArgs` for a
/// bare repository.
pub fn discover_workdir(path: &Path) -> Result<PathBuf> {
    let repo = git2::Repository::discover(path)?;
    repo.workdir().map(Path::to_path_buf).ok_or_else(|| {
        RehearsalError::invalid_args("repository has no working directory")
    })
}

impl Git {
    /// Open the repository containing `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - Any directory inside the repository
    /// * `remote` - Remote name used by pull, push and remote tag deletion
    /// * `runner` - Runs the `git` CLI for network operations
    ///
    /// # Errors
    ///
    /// Fails when `path` is not inside a non-bare git repository.
    pub fn open(
        path: &Path,
        remote: impl Into<String>,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self> {
        let workdir = discover_workdir(path)?;
        let repo = git2::Repository::open(&workdir)?;

        debug!("opened repository at {}", workdir.display());

        Ok(Self {
            repo: Arc::new(Mutex::new(repo)),
            runner,
            remote: remote.into(),
            workdir,
        })
    }

    fn git(&self) -> Invocation {
        Invocation::new("git").current_dir(&self.workdir)
    }

    async fn run_git(&self, invocation: Invocation) -> Result<()> {
        run_checked(self.runner.as_ref(), invocation).await?;
        Ok(())
    }
}

#[async_trait]
impl VersionControl for Git {
    fn workdir(&self) -> PathBuf {
        self.workdir.clone()
    }

    async fn is_available(&self) -> Result<bool> {
        match self.runner.run(self.git().arg("--version")).await {
            Ok(output) => Ok(output.is_success()),
            Err(RehearsalError::ToolNotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Untracked files count as changes, ignored files do not.
    async fn is_clean(&self) -> Result<bool> {
        let repo = self.repo.lock().await;

        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = repo.statuses(Some(&mut opts))?;

        for entry in statuses.iter() {
            debug!(
                "uncommitted change: {} ({:?})",
                entry.path().unwrap_or("<non-utf8 path>"),
                entry.status()
            );
        }

        Ok(statuses.is_empty())
    }

    /// Switch the working tree and HEAD to a local branch.
    ///
    /// # Arguments
    ///
    /// * `branch` - Short name of an existing local branch
    ///
    /// # Errors
    ///
    /// Fails when the branch does not exist or local changes would be
    /// overwritten.
    async fn checkout(&self, branch: &str) -> Result<()> {
        info!("switching to branch: {branch}");
        let repo = self.repo.lock().await;
        let ref_name = format!("refs/heads/{branch}");
        let target_obj = repo.revparse_single(&ref_name)?;
        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.safe();
        repo.checkout_tree(&target_obj, Some(&mut checkout))?;
        repo.set_head(&ref_name)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `CommandFailed` when `git pull` exits non-zero.
    async fn pull(&self, branch: &str) -> Result<()> {
        info!("pulling {branch} from {}", self.remote);
        self.run_git(self.git().args(["pull", self.remote.as_str(), branch]))
            .await
    }

    /// Create `branch` at HEAD and switch to it.
    ///
    /// # Arguments
    ///
    /// * `branch` - Name of the new branch
    ///
    /// # Errors
    ///
    /// Fails when a branch of that name already exists.
    async fn create_branch(&self, branch: &str) -> Result<()> {
        info!("creating branch: {branch}");
        {
            let repo = self.repo.lock().await;
            let head = repo.head()?;
            let commit = head.peel_to_commit()?;
            // no force: an existing branch with this name is an error
            repo.branch(branch, &commit, false)?;
        }
        self.checkout(branch).await
    }

    async fn add_all(&self) -> Result<()> {
        debug!("adding changed files to index");
        let repo = self.repo.lock().await;
        let mut index = repo.index()?;
        index.read(false)?;
        index.add_all(["."], git2::IndexAddOption::DEFAULT, None)?;
        index.update_all(["."], None)?;
        index.write()?;
        Ok(())
    }

    /// Commit the index on top of HEAD using the configured identity.
    ///
    /// # Errors
    ///
    /// Fails when `user.name` or `user.email` is not configured.
    async fn commit(&self, message: &str) -> Result<()> {
        debug!("committing changes with msg: {message}");
        let repo = self.repo.lock().await;
        let committer = repo.signature()?;
        debug!(
            "using committer: user: {}, email: {}",
            committer.name().unwrap_or(""),
            committer.email().unwrap_or("")
        );
        let mut index = repo.index()?;
        let oid = index.write_tree()?;
        let tree = repo.find_tree(oid)?;
        let parent_commit = repo.head()?.peel_to_commit()?;
        let commit = repo.commit(
            Some("HEAD"),
            &committer,
            &committer,
            message,
            &tree,
            &[&parent_commit],
        )?;
        info!("created commit {commit}");
        Ok(())
    }

    /// Push `branch` with upstream tracking.
    ///
    /// # Errors
    ///
    /// Returns `CommandFailed` when the push is rejected.
    async fn push_branch(&self, branch: &str) -> Result<()> {
        info!("pushing branch {branch} to {}", self.remote);
        self.run_git(self.git().args(["push", "-u", self.remote.as_str(), branch]))
            .await
    }

    async fn fetch_all(&self) -> Result<()> {
        debug!("fetching all remotes");
        self.run_git(self.git().args(["fetch", "--all", "--tags"]))
            .await
    }

    async fn list_tags(&self) -> Result<Vec<String>> {
        let repo = self.repo.lock().await;
        let tags = repo
            .tag_names(None)?
            .iter()
            .flatten()
            .map(String::from)
            .collect::<Vec<String>>();
        debug!("found {} local tags", tags.len());
        Ok(tags)
    }

    /// # Errors
    ///
    /// Stops at the first tag that cannot be deleted.
    async fn delete_local_tags(&self, tags: Vec<String>) -> Result<()> {
        info!("deleting {} local tags", tags.len());
        let repo = self.repo.lock().await;
        for tag in tags.iter() {
            debug!("deleting local tag: {tag}");
            repo.tag_delete(tag)?;
        }
        Ok(())
    }

    /// Delete all `tags` from the remote in a single push. Each tag is
    /// passed as `refs/tags/<name>` so a branch of the same name is never
    /// matched.
    ///
    /// # Arguments
    ///
    /// * `tags` - Tag names without the `refs/tags/` prefix
    ///
    /// # Errors
    ///
    /// Returns `CommandFailed` when the push exits non-zero.
    async fn delete_remote_tags(&self, tags: Vec<String>) -> Result<()> {
        info!("deleting {} tags from {}", tags.len(), self.remote);
        self.run_git(
            self.git()
                .args(["push", self.remote.as_str(), "--delete"])
                .args(tags.iter().map(|tag| format!("refs/tags/{tag}"))),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        process::{CommandOutput, MockCommandRunner},
        test_helpers::{head_message, init_test_repo},
    };
    use tempfile::TempDir;

    fn open(dir: &Path, runner: MockCommandRunner) -> Git {
        Git::open(dir, "origin", Arc::new(runner)).unwrap()
    }

    #[tokio::test]
    async fn reports_clean_and_dirty_trees() {
        let tmp = TempDir::new().unwrap();
        init_test_repo(tmp.path());
        let git = open(tmp.path(), MockCommandRunner::new());

        assert!(git.is_clean().await.unwrap());

        std::fs::write(tmp.path().join("untracked.txt"), "new").unwrap();
        assert!(!git.is_clean().await.unwrap());
    }

    #[test]
    fn discovers_workdir_from_subdirectory() {
        let tmp = TempDir::new().unwrap();
        init_test_repo(tmp.path());
        let nested = tmp.path().join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();

        let workdir = discover_workdir(&nested).unwrap();

        assert_eq!(
            workdir.canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn creates_and_switches_branch() {
        let tmp = TempDir::new().unwrap();
        let repo = init_test_repo(tmp.path());
        let git = open(tmp.path(), MockCommandRunner::new());

        git.create_branch("rehearsal_20240101_000000").await.unwrap();

        let head = repo.head().unwrap();
        assert_eq!(head.shorthand(), Some("rehearsal_20240101_000000"));
    }

    #[tokio::test]
    async fn rejects_existing_branch_name() {
        let tmp = TempDir::new().unwrap();
        init_test_repo(tmp.path());
        let git = open(tmp.path(), MockCommandRunner::new());

        git.create_branch("feature").await.unwrap();
        git.checkout("main").await.unwrap();

        let err = git.create_branch("feature").await.unwrap_err();
        assert!(matches!(err, RehearsalError::GitError(_)));
    }

    #[tokio::test]
    async fn stages_and_commits_changes() {
        let tmp = TempDir::new().unwrap();
        let repo = init_test_repo(tmp.path());
        let git = open(tmp.path(), MockCommandRunner::new());

        std::fs::write(tmp.path().join("pyproject.toml"), "[project]\n# m\n")
            .unwrap();
        git.add_all().await.unwrap();
        git.commit("fix: typo").await.unwrap();

        assert!(git.is_clean().await.unwrap());
        assert_eq!(head_message(&repo), "fix: typo");
    }

    #[tokio::test]
    async fn lists_and_deletes_local_tags() {
        let tmp = TempDir::new().unwrap();
        let repo = init_test_repo(tmp.path());
        {
            let head = repo.head().unwrap().peel_to_commit().unwrap();
            repo.tag_lightweight("v1", head.as_object(), false).unwrap();
            repo.tag_lightweight("v2", head.as_object(), false).unwrap();
        }
        let git = open(tmp.path(), MockCommandRunner::new());

        let tags = git.list_tags().await.unwrap();
        assert_eq!(tags, vec!["v1".to_string(), "v2".to_string()]);

        git.delete_local_tags(tags).await.unwrap();
        assert!(git.list_tags().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn pushes_branch_with_upstream() {
        let tmp = TempDir::new().unwrap();
        init_test_repo(tmp.path());
        let workdir = tmp.path().canonicalize().unwrap();

        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(move |inv| {
                inv.program == "git"
                    && inv.args == ["push", "-u", "origin", "feature"]
                    && inv
                        .cwd
                        .as_ref()
                        .and_then(|c| c.canonicalize().ok())
                        .as_ref()
                        == Some(&workdir)
            })
            .times(1)
            .returning(|_| Ok(CommandOutput::success("")));

        let git = open(tmp.path(), runner);
        git.push_branch("feature").await.unwrap();
    }

    #[tokio::test]
    async fn deletes_remote_tags_by_full_ref_in_one_push() {
        let tmp = TempDir::new().unwrap();
        init_test_repo(tmp.path());

        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|inv| {
                inv.program == "git"
                    && inv.args
                        == [
                            "push",
                            "origin",
                            "--delete",
                            "refs/tags/v1",
                            "refs/tags/v2",
                        ]
            })
            .times(1)
            .returning(|_| Ok(CommandOutput::success("")));

        let git = open(tmp.path(), runner);
        git.delete_remote_tags(vec!["v1".into(), "v2".into()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn surfaces_failed_pull() {
        let tmp = TempDir::new().unwrap();
        init_test_repo(tmp.path());

        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|inv| inv.args == ["pull", "origin", "main"])
            .times(1)
            .returning(|_| {
                Ok(CommandOutput::failure(1, "fatal: couldn't find remote"))
            });

        let git = open(tmp.path(), runner);
        let err = git.pull("main").await.unwrap_err();

        assert!(matches!(
            err,
            RehearsalError::CommandFailed { status: 1, .. }
        ));
    }
}
