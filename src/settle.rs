//! Waiting for downstream automation after a pull request is merged.
use log::*;
use std::{collections::HashSet, time::Duration};
use tokio::time::{Instant, sleep};

use crate::{
    error::{RehearsalError, Result},
    vcs::VersionControl,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleStrategy {
    /// Sleep for a fixed duration.
    Delay(Duration),
    /// Fetch and list tags every `interval` until one not present before the
    /// merge appears, failing once `timeout` has elapsed.
    PollTags { interval: Duration, timeout: Duration },
}

/// Tags known before the merge. Only collected when polling.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Baseline(Option<HashSet<String>>);

impl SettleStrategy {
    /// Record whatever state is needed to detect the downstream effect.
    pub async fn baseline(&self, vcs: &dyn VersionControl) -> Result<Baseline> {
        match self {
            SettleStrategy::Delay(_) => Ok(Baseline(None)),
            SettleStrategy::PollTags { .. } => {
                vcs.fetch_all().await?;
                let tags = vcs.list_tags().await?;
                debug!("baseline contains {} tags", tags.len());
                Ok(Baseline(Some(tags.into_iter().collect())))
            }
        }
    }

    /// Wait according to the strategy. Returns the new tag when polling.
    pub async fn wait(
        &self,
        vcs: &dyn VersionControl,
        baseline: &Baseline,
    ) -> Result<Option<String>> {
        match *self {
            SettleStrategy::Delay(delay) => {
                info!("waiting {}s for downstream automation", delay.as_secs());
                sleep(delay).await;
                Ok(None)
            }
            SettleStrategy::PollTags { interval, timeout } => {
                let known = baseline.0.clone().unwrap_or_default();
                poll_for_new_tag(vcs, &known, interval, timeout)
                    .await
                    .map(Some)
            }
        }
    }
}

async fn poll_for_new_tag(
    vcs: &dyn VersionControl,
    known: &HashSet<String>,
    interval: Duration,
    timeout: Duration,
) -> Result<String> {
    info!(
        "polling for a new tag every {}s (timeout {}s)",
        interval.as_secs(),
        timeout.as_secs()
    );

    let deadline = Instant::now() + timeout;

    loop {
        sleep(interval).await;

        vcs.fetch_all().await?;

        if let Some(tag) = vcs
            .list_tags()
            .await?
            .into_iter()
            .find(|tag| !known.contains(tag))
        {
            info!("found new tag: {tag}");
            return Ok(tag);
        }

        if Instant::now() >= deadline {
            return Err(RehearsalError::SettleTimeout(timeout));
        }

        debug!("no new tag yet");
    }
}
