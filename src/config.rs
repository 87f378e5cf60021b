//! Configuration loading and parsing for `rehearsal.toml` files.
//!
//! Every field is optional. Command line flags take precedence over values
//! read from the file.
use log::*;
use serde::Deserialize;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    error::{RehearsalError, Result},
    settle::SettleStrategy,
};

/// Default configuration filename, looked up in the repository root.
pub const DEFAULT_CONFIG_FILE: &str = "rehearsal.toml";

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_BRANCH_PREFIX: &str = "rehearsal";
pub const DEFAULT_MARKER_FILE: &str = "pyproject.toml";
pub const DEFAULT_PR_BODY: &str =
    "Automated pull request opened to exercise the release workflow.";

/// Fixed wait after merging, long enough for the release job to finish.
pub const DEFAULT_SETTLE_DELAY_SECS: u64 = 35;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettleMode {
    /// Sleep for a fixed amount of time.
    #[default]
    Delay,
    /// Poll the remote until a new tag shows up.
    PollTags,
}

/// How to wait for downstream automation after the merge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SettleConfig {
    pub mode: SettleMode,
    pub delay_secs: u64,
    pub poll_interval_secs: u64,
    pub poll_timeout_secs: u64,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            mode: SettleMode::Delay,
            delay_secs: DEFAULT_SETTLE_DELAY_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
        }
    }
}

impl SettleConfig {
    pub fn strategy(&self) -> Result<SettleStrategy> {
        match self.mode {
            SettleMode::Delay => {
                Ok(SettleStrategy::Delay(Duration::from_secs(self.delay_secs)))
            }
            SettleMode::PollTags => {
                if self.poll_interval_secs == 0 {
                    return Err(RehearsalError::invalid_config(
                        "settle.poll_interval_secs must be greater than 0",
                    ));
                }
                if self.poll_timeout_secs < self.poll_interval_secs {
                    return Err(RehearsalError::invalid_config(
                        "settle.poll_timeout_secs must be at least settle.poll_interval_secs",
                    ));
                }
                Ok(SettleStrategy::PollTags {
                    interval: Duration::from_secs(self.poll_interval_secs),
                    timeout: Duration::from_secs(self.poll_timeout_secs),
                })
            }
        }
    }
}

/// Root configuration structure for `rehearsal.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Branch pull requests target and the procedure syncs with.
    pub default_branch: String,
    /// Remote pushed to and pulled from.
    pub remote: String,
    /// Prefix of generated feature branches.
    pub branch_prefix: String,
    /// Tracked file, relative to the repository root, that receives the
    /// marker line.
    pub marker_file: PathBuf,
    /// Body of generated pull requests.
    pub pr_body: String,
    pub settle: SettleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_branch: DEFAULT_BRANCH.into(),
            remote: DEFAULT_REMOTE.into(),
            branch_prefix: DEFAULT_BRANCH_PREFIX.into(),
            marker_file: PathBuf::from(DEFAULT_MARKER_FILE),
            pr_body: DEFAULT_PR_BODY.into(),
            settle: SettleConfig::default(),
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`]
    /// is looked up in `repo_root` and defaults are used when it is absent.
    pub fn load(path: Option<&Path>, repo_root: &Path) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(RehearsalError::MissingFile(path.to_path_buf()));
            }
            debug!("loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)?;
            return Self::from_toml(&content);
        }

        let default_path = repo_root.join(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            debug!("loading configuration from {}", default_path.display());
            let content = std::fs::read_to_string(&default_path)?;
            return Self::from_toml(&content);
        }

        info!("repository configuration not found: using default");
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_branch.trim().is_empty() {
            return Err(RehearsalError::invalid_config(
                "default_branch must not be empty",
            ));
        }
        if self.remote.trim().is_empty() {
            return Err(RehearsalError::invalid_config(
                "remote must not be empty",
            ));
        }
        if self.branch_prefix.trim().is_empty() {
            return Err(RehearsalError::invalid_config(
                "branch_prefix must not be empty",
            ));
        }
        if self.marker_file.as_os_str().is_empty() {
            return Err(RehearsalError::invalid_config(
                "marker_file must not be empty",
            ));
        }
        if self.marker_file.is_absolute() {
            return Err(RehearsalError::invalid_config(
                "marker_file must be relative to the repository root",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn loads_defaults() {
        let config = Config::default();
        assert_eq!(config.default_branch, "main");
        assert_eq!(config.remote, "origin");
        assert_eq!(config.marker_file, PathBuf::from("pyproject.toml"));
        assert_eq!(
            config.settle.strategy().unwrap(),
            SettleStrategy::Delay(Duration::from_secs(35))
        );
    }

    #[test]
    fn parses_partial_toml() {
        let config = Config::from_toml(
            r#"
default_branch = "trunk"
marker_file = "setup.cfg"

[settle]
mode = "poll_tags"
poll_interval_secs = 10
"#,
        )
        .unwrap();

        assert_eq!(config.default_branch, "trunk");
        assert_eq!(config.remote, "origin");
        assert_eq!(config.marker_file, PathBuf::from("setup.cfg"));
        assert_eq!(
            config.settle.strategy().unwrap(),
            SettleStrategy::PollTags {
                interval: Duration::from_secs(10),
                timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
            }
        );
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            Config::from_toml(r#"default_branch = " ""#),
            Err(RehearsalError::InvalidConfig(_))
        ));
        assert!(matches!(
            Config::from_toml(r#"marker_file = "/etc/passwd""#),
            Err(RehearsalError::InvalidConfig(_))
        ));
        assert!(matches!(
            Config::from_toml("[settle]\nmode = \"sometimes\""),
            Err(RehearsalError::TomlParseError(_))
        ));

        let settle = SettleConfig {
            mode: SettleMode::PollTags,
            poll_interval_secs: 0,
            ..SettleConfig::default()
        };
        assert!(settle.strategy().is_err());
    }

    #[test]
    fn load_falls_back_to_default_without_file() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load(None, tmp.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_reads_file_from_repo_root() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(DEFAULT_CONFIG_FILE),
            "branch_prefix = \"drill\"\n",
        )
        .unwrap();

        let config = Config::load(None, tmp.path()).unwrap();
        assert_eq!(config.branch_prefix, "drill");
    }

    #[test]
    fn load_requires_explicit_path_to_exist() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.toml");

        let err = Config::load(Some(&missing), tmp.path()).unwrap_err();
        assert!(matches!(err, RehearsalError::MissingFile(_)));
    }
}
