//! Streaming an asset body to disk.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use nexus_core::error::Error;

use crate::error::transport;

/// A `<destination>.<id>.part` file that is removed on drop unless
/// committed. The random id keeps two transfers from sharing a partial file
/// even when one destination is named like another's partial file.
///
/// Dropping covers every way a transfer can end early: an error returned
/// with `?`, a panic, or the future being cancelled on interrupt.
pub(crate) struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    pub fn for_destination(destination: &Path) -> Self {
        let mut name = destination
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.part", Uuid::new_v4().simple()));

        Self {
            path: destination.with_file_name(name),
            committed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move the finished file onto `destination`.
    pub async fn commit(mut self, destination: &Path) -> Result<(), Error> {
        fs::rename(&self.path, destination).await?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed partial download"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove partial download"),
        }
    }
}

/// Write a successful response body to `destination` chunk by chunk.
///
/// Returns the number of bytes written.
pub(crate) async fn write_body(
    response: reqwest::Response,
    destination: &Path,
) -> Result<u64, Error> {
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let partial = PartialFile::for_destination(destination);
    let mut file = File::create(partial.path()).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(transport)?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        trace!(bytes = written, "download progress");
    }

    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    partial.commit(destination).await?;
    Ok(written)
}
