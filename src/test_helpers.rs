//! Common test helper functions shared across test modules.
use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;

use crate::{
    config::Config,
    host::types::{PullRequest, RepoId},
};

/// File the open-pr tests append their marker to.
pub const TEST_MARKER_FILE: &str = "pyproject.toml";

/// Initializes a git repository on `main` with one commit containing
/// [`TEST_MARKER_FILE`] and a local committer identity.
pub fn init_test_repo(dir: &Path) -> git2::Repository {
    let mut opts = git2::RepositoryInitOptions::new();
    opts.initial_head("main");
    let repo = git2::Repository::init_opts(dir, &opts).unwrap();

    {
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
    }

    std::fs::write(dir.join(TEST_MARKER_FILE), "[project]\nname = \"demo\"\n")
        .unwrap();

    {
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(TEST_MARKER_FILE)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let signature = repo.signature().unwrap();
        repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            "chore: initial commit",
            &tree,
            &[],
        )
        .unwrap();
    }

    repo
}

/// Message of the commit HEAD points at.
pub fn head_message(repo: &git2::Repository) -> String {
    repo.head()
        .unwrap()
        .peel_to_commit()
        .unwrap()
        .message()
        .unwrap_or("")
        .to_string()
}

/// Fixed instant used wherever a test needs a deterministic clock.
pub fn test_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 2).unwrap()
}

/// Default configuration with a zero settle delay.
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.settle.delay_secs = 0;
    config
}

pub fn create_test_repo_id() -> RepoId {
    "octocat/hello-world".parse().unwrap()
}

pub fn create_test_pull_request() -> PullRequest {
    PullRequest {
        number: 42,
        url: "https://github.com/octocat/hello-world/pull/42".into(),
    }
}
