//! Precondition checks run before any procedure mutates anything.
use log::*;

use crate::{
    error::{RehearsalError, Result},
    host::HostingPlatform,
    vcs::VersionControl,
};

/// Hosting CLI installed and logged in.
pub async fn check_host(host: &dyn HostingPlatform) -> Result<()> {
    if !host.is_installed().await? {
        return Err(RehearsalError::tool_not_found(host.tool()));
    }
    debug!("{}: installed", host.tool());

    if !host.is_authenticated().await? {
        return Err(RehearsalError::NotAuthenticated(format!(
            "`{} auth status` reported no valid login",
            host.tool()
        )));
    }
    info!("{}: authenticated", host.tool());

    Ok(())
}

/// `git` CLI available for remote operations.
pub async fn check_vcs(vcs: &dyn VersionControl) -> Result<()> {
    if !vcs.is_available().await? {
        return Err(RehearsalError::tool_not_found("git"));
    }
    debug!("git: installed");
    Ok(())
}

/// No uncommitted or untracked changes in the working tree.
pub async fn check_clean_tree(vcs: &dyn VersionControl) -> Result<()> {
    if !vcs.is_clean().await? {
        return Err(RehearsalError::DirtyWorkingTree);
    }
    debug!("working tree is clean");
    Ok(())
}
