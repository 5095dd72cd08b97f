//! Exclusive opening of the download destination.

use std::fs::OpenOptions;
use std::path::Path;

use fs2::FileExt;
use tokio::fs::File;
use tracing::debug;

use super::error::DownloadError;

/// Opens `path` for exclusive writing and truncates it.
///
/// The file is created if missing, then locked with an exclusive advisory
/// lock on the open handle, and only then truncated, so a file held by
/// another writer is never clobbered. The lock lives as long as the returned
/// handle.
///
/// # Errors
///
/// Returns [`DownloadError::DestinationUnavailable`] if the path cannot be
/// opened (missing parent directory, permissions, a directory) or another
/// writer holds the lock.
pub(crate) async fn open_exclusive(path: &Path) -> Result<File, DownloadError> {
    let owned = path.to_path_buf();
    let opened = tokio::task::spawn_blocking(move || -> std::io::Result<std::fs::File> {
        #[allow(clippy::suspicious_open_options)]
        let file = OpenOptions::new().write(true).create(true).open(&owned)?;
        file.try_lock_exclusive()?;
        file.set_len(0)?;
        Ok(file)
    })
    .await
    .map_err(|join| DownloadError::destination_unavailable(path, std::io::Error::other(join)))?;

    let file = opened.map_err(|e| DownloadError::destination_unavailable(path, e))?;
    debug!(path = %path.display(), "destination opened exclusively");
    Ok(File::from_std(file))
}
