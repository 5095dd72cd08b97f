//! Chunked async copy with per-chunk progress and cooperative cancellation.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// Errors from [`copy_chunked`].
#[derive(Debug, Error)]
pub enum CopyError {
    /// The copy parameters are unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Reading from the source failed.
    #[error("read failed after {bytes_copied} bytes: {source}")]
    Read {
        /// Bytes written before the failure.
        bytes_copied: u64,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Writing to the destination failed.
    #[error("write failed after {bytes_copied} bytes: {source}")]
    Write {
        /// Bytes written before the failure.
        bytes_copied: u64,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The cancellation token fired at a chunk boundary.
    #[error("copy cancelled after {bytes_copied} bytes")]
    Cancelled {
        /// Bytes written before cancellation took effect.
        bytes_copied: u64,
    },
}

impl CopyError {
    /// Bytes already written to the destination when the copy stopped.
    #[must_use]
    pub fn bytes_copied(&self) -> u64 {
        match self {
            Self::InvalidArgument(_) => 0,
            Self::Read { bytes_copied, .. }
            | Self::Write { bytes_copied, .. }
            | Self::Cancelled { bytes_copied } => *bytes_copied,
        }
    }
}

/// Copies `source` into `destination` in chunks of exactly `chunk_size` bytes.
///
/// Each iteration checks `cancel`, then reads until the reusable buffer is
/// full or the source is exhausted, however many reads that takes. The chunk
/// is written, `cancel` is checked again and the cumulative count goes to
/// `on_bytes_written`. Only the final chunk may be shorter. Cancellation never
/// interrupts an in-flight read or write and bytes already written stay in
/// `destination`.
///
/// If a read fails part way through a chunk, the bytes received so far are
/// still written (without a callback) before the error is returned.
///
/// The destination is not flushed; that belongs to whoever owns it.
///
/// # Errors
///
/// - [`CopyError::InvalidArgument`] if `chunk_size` is zero
/// - [`CopyError::Read`] / [`CopyError::Write`] on IO failure
/// - [`CopyError::Cancelled`] when `cancel` fires between chunks
pub async fn copy_chunked<R, W, F>(
    source: &mut R,
    destination: &mut W,
    chunk_size: usize,
    mut on_bytes_written: F,
    cancel: &CancellationToken,
) -> Result<u64, CopyError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
    F: FnMut(u64),
{
    if chunk_size == 0 {
        return Err(CopyError::InvalidArgument("chunk size must be positive"));
    }

    let mut buffer = vec![0u8; chunk_size];
    let mut bytes_copied: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(CopyError::Cancelled { bytes_copied });
        }

        let (filled, read_result) = fill_chunk(source, &mut buffer).await;

        if filled > 0 {
            destination
                .write_all(&buffer[..filled])
                .await
                .map_err(|source| CopyError::Write {
                    bytes_copied,
                    source,
                })?;
            bytes_copied += filled as u64;
        }

        if let Err(source) = read_result {
            return Err(CopyError::Read {
                bytes_copied,
                source,
            });
        }
        if filled == 0 {
            break;
        }

        if cancel.is_cancelled() {
            return Err(CopyError::Cancelled { bytes_copied });
        }

        on_bytes_written(bytes_copied);

        // A short chunk means the source hit EOF.
        if filled < chunk_size {
            break;
        }
    }

    Ok(bytes_copied)
}

/// Reads into `buffer` until it is full or a read returns 0.
///
/// Returns how many bytes landed in the buffer alongside the read outcome,
/// so a failure does not lose bytes already received.
async fn fill_chunk<R>(source: &mut R, buffer: &mut [u8]) -> (usize, std::io::Result<()>)
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut filled = 0;
    while filled < buffer.len() {
        match source.read(&mut buffer[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(error) if error.kind() == std::io::ErrorKind::Interrupted => {}
            Err(error) => return (filled, Err(error)),
        }
    }
    (filled, Ok(()))
}
