//! Appends the automation marker line to a tracked file.
use log::*;
use std::path::Path;
use tokio::{fs, io::AsyncWriteExt};

use crate::error::{RehearsalError, Result};

/// Append `line` to the file at `path` as a new line.
///
/// The file must already exist. If its current content does not end with a
/// newline one is inserted first so the marker always lands on its own line.
pub async fn append_marker(path: &Path, line: &str) -> Result<()> {
    if !fs::try_exists(path).await? {
        return Err(RehearsalError::MissingFile(path.to_path_buf()));
    }

    let existing = fs::read(path).await?;

    let mut addition = String::new();
    if !existing.is_empty() && !existing.ends_with(b"\n") {
        addition.push('\n');
    }
    addition.push_str(line);
    addition.push('\n');

    let mut file = fs::OpenOptions::new().append(true).open(path).await?;
    file.write_all(addition.as_bytes()).await?;
    file.flush().await?;

    info!("appended marker to {}", path.display());

    Ok(())
}
