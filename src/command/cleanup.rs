//! Delete every release and tag of a throwaway repository.
//!
//! Fail-fast: the first failing call aborts whatever is left. Releases are
//! always handled before tags.
use log::*;

use crate::{
    command::{Tools, preflight},
    error::Result,
    host::{HostingPlatform, types::RepoId},
    vcs::VersionControl,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Only list what would be deleted.
    pub dry_run: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    /// Release ids deleted, or that would have been in a dry run.
    pub releases: Vec<u64>,
    /// Tags deleted, or that would have been in a dry run.
    pub tags: Vec<String>,
    pub dry_run: bool,
}

/// Operator confirmation, asked once preflight has passed.
pub type Confirm<'a> = &'a (dyn Fn(&RepoId) -> Result<()> + Sync);

/// Execute the cleanup procedure against `repo` and the local checkout.
///
/// `confirm` runs after the preflight checks and before anything is listed.
/// It is skipped in a dry run.
pub async fn execute(
    tools: &Tools,
    repo: &RepoId,
    options: CleanupOptions,
    confirm: Confirm<'_>,
) -> Result<CleanupReport> {
    let vcs = tools.vcs.as_ref();
    let host = tools.host.as_ref();

    preflight::check_host(host).await?;
    preflight::check_vcs(vcs).await?;

    if !options.dry_run {
        confirm(repo)?;
    }

    let releases = delete_releases(host, repo, options.dry_run).await?;
    let tags = delete_tags(vcs, options.dry_run).await?;

    Ok(CleanupReport {
        releases,
        tags,
        dry_run: options.dry_run,
    })
}

async fn delete_releases(
    host: &dyn HostingPlatform,
    repo: &RepoId,
    dry_run: bool,
) -> Result<Vec<u64>> {
    info!("fetching releases for {repo}");
    let releases = host.list_releases(repo).await?;

    if releases.is_empty() {
        info!("no releases found for {repo}");
        return Ok(vec![]);
    }

    let mut deleted = vec![];

    for release in releases.iter() {
        let tag = release.tag_name.as_deref().unwrap_or("<untagged>");

        if dry_run {
            warn!("dry_run: would delete release {} ({tag})", release.id);
        } else {
            info!("deleting release {} ({tag})", release.id);
            host.delete_release(repo, release.id).await?;
        }

        deleted.push(release.id);
    }

    info!("processed {} releases", deleted.len());

    Ok(deleted)
}

async fn delete_tags(
    vcs: &dyn VersionControl,
    dry_run: bool,
) -> Result<Vec<String>> {
    info!("fetching local tags");
    let tags = vcs.list_tags().await?;

    if tags.is_empty() {
        info!("no tags found");
        return Ok(vec![]);
    }

    if dry_run {
        warn!("dry_run: would delete tags locally and remotely: {tags:?}");
        return Ok(tags);
    }

    vcs.delete_local_tags(tags.clone()).await?;
    vcs.delete_remote_tags(tags.clone()).await?;

    info!("deleted {} tags", tags.len());

    Ok(tags)
}
