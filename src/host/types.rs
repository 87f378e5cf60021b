use regex::Regex;
use serde::Deserialize;
use std::{fmt, str::FromStr, sync::LazyLock};

use crate::error::RehearsalError;

static REPO_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<owner>[A-Za-z0-9_.-]+)/(?<name>[A-Za-z0-9_.-]+)$")
        .unwrap()
});

/// Repository identifier in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    /// REST path of the repository's releases collection.
    pub fn releases_path(&self) -> String {
        format!("repos/{}/{}/releases", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = RehearsalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = REPO_ID_REGEX
            .captures(s.trim())
            .ok_or_else(|| RehearsalError::InvalidRepo(s.to_string()))?;

        let owner = captures["owner"].to_string();
        let name = captures["name"].to_string();

        if owner.chars().all(|c| c == '.') || name.chars().all(|c| c == '.') {
            return Err(RehearsalError::InvalidRepo(s.to_string()));
        }

        Ok(Self { owner, name })
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePrRequest {
    pub head_branch: String,
    pub base_branch: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePrRequest {
    /// PR URL or number, anything `gh pr merge` accepts.
    pub pr: String,
    pub delete_branch: bool,
}

/// Release entry as returned by the releases REST endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub id: u64,
    #[serde(default)]
    pub tag_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repo_id() {
        let repo: RepoId = "octocat/hello-world".parse().unwrap();
        assert_eq!(repo.owner, "octocat");
        assert_eq!(repo.name, "hello-world");
        assert_eq!(repo.to_string(), "octocat/hello-world");
        assert_eq!(repo.releases_path(), "repos/octocat/hello-world/releases");
    }

    #[test]
    fn rejects_malformed_repo_ids() {
        for input in
            ["", "octocat", "octocat/", "/hello", "a/b/c", "a b/c", "../x"]
        {
            let result = input.parse::<RepoId>();
            assert!(
                matches!(result, Err(RehearsalError::InvalidRepo(_))),
                "expected {input:?} to be rejected"
            );
        }
    }

    #[test]
    fn deserializes_release_without_tag() {
        let release: Release = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        assert_eq!(
            release,
            Release {
                id: 7,
                tag_name: None
            }
        );
    }
}
