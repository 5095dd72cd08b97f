//! HTTP client wrapper that streams a response body to disk with progress.
//!
//! This module provides the `HttpClient` struct which owns the connection
//! pool and runs one [`DownloadRequest`] at a time per call. Calls share no
//! state besides the pool, so concurrent calls do not interfere.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::TryStreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_LENGTH;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::task::JoinHandle;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::CONNECT_TIMEOUT_SECS;
use super::copier::{CopyError, copy_chunked};
use super::destination::open_exclusive;
use super::error::DownloadError;
use super::progress::ProgressSample;
use super::request::DownloadRequest;
use crate::user_agent;

/// HTTP client for streaming single-file downloads.
///
/// This client is designed to be created once and reused for multiple downloads,
/// taking advantage of connection pooling.
///
/// # Example
///
/// ```no_run
/// use streamget_core::download::{DownloadRequest, HttpClient, ProgressSample};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new()?;
/// let request = DownloadRequest::new("https://example.com/big.iso", "big.iso")
///     .with_observer(|sample: ProgressSample| {
///         if let Some(percent) = sample.percent() {
///             eprintln!("{percent:.1}%");
///         }
///     });
/// let outcome = client.download(request).await?;
/// println!("{} bytes", outcome.bytes_transferred);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

/// Result of a completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Destination path that now holds the payload.
    pub path: PathBuf,
    /// Bytes written to the destination.
    pub bytes_transferred: u64,
    /// Content length declared by the server, when present.
    pub total_bytes: Option<u64>,
}

impl HttpClient {
    /// Creates a client with the default connect timeout (30 seconds).
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the TLS backend or system
    /// configuration cannot be initialized.
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
    }

    /// Creates a client with an explicit connect timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the client cannot be built.
    pub fn with_connect_timeout(connect_timeout: Duration) -> Result<Self, DownloadError> {
        let client = build_client(connect_timeout)
            .map_err(|source| DownloadError::ClientBuild { source })?;
        Ok(Self { client })
    }

    /// Downloads `request.url()` into `request.destination()`.
    ///
    /// The destination is opened (exclusively, truncated) before any network
    /// traffic, so a locked destination fails fast. The body is then copied
    /// in `request.chunk_size()` chunks; after each chunk the observer, if
    /// any, receives a [`ProgressSample`]. The whole call is bounded by
    /// `request.timeout()`.
    ///
    /// On every exit path the response body is dropped and the destination
    /// flushed and closed before this returns. Partial files are left in
    /// place.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` whose [`kind`](DownloadError::kind) is:
    /// - `InvalidArgument` for a zero chunk size or timeout, or a non-HTTP URL
    /// - `DestinationUnavailable` if the destination cannot be opened exclusively
    /// - `ConnectFailure` for transport errors and non-success statuses
    /// - `IoFailure` if reading the body or writing the destination fails
    /// - `Cancelled` if the request's token fires
    /// - `Timeout` if the time bound elapses
    #[must_use = "download result reports whether the file is complete"]
    #[instrument(skip(self, request), fields(url = %request.url(), dest = %request.destination().display()))]
    pub async fn download(&self, request: DownloadRequest) -> Result<DownloadOutcome, DownloadError> {
        validate_request(&request)?;

        let deadline = Deadline::arm(request.cancellation(), request.timeout());
        let result = self.run(&request, &deadline.token).await;
        let timed_out = deadline.has_fired();
        drop(deadline);

        match result {
            Err(DownloadError::Cancelled {
                url,
                bytes_transferred,
            }) if timed_out => {
                warn!(bytes = bytes_transferred, timeout = ?request.timeout(), "download timed out");
                Err(DownloadError::timeout(url, request.timeout(), bytes_transferred))
            }
            Err(error) => {
                debug!(kind = %error.kind(), error = %error, "download failed");
                Err(error)
            }
            ok => ok,
        }
    }

    async fn run(
        &self,
        request: &DownloadRequest,
        cancel: &CancellationToken,
    ) -> Result<DownloadOutcome, DownloadError> {
        let url = request.url();
        let path = request.destination();

        if cancel.is_cancelled() {
            return Err(DownloadError::cancelled(url, 0));
        }

        let file = open_exclusive(path).await?;
        let mut writer = BufWriter::with_capacity(request.chunk_size(), file);

        let response = match self.connect(url, request.timeout(), cancel).await {
            Ok(response) => response,
            Err(error) => {
                close_after_failure(&mut writer, path).await;
                return Err(error);
            }
        };

        let total_bytes = declared_content_length(&response);
        debug!(?total_bytes, status = response.status().as_u16(), "response headers received");

        let mut body = StreamReader::new(Box::pin(response.bytes_stream().map_err(body_error_to_io)));
        let observer = request
            .observer()
            .filter(|observer| total_bytes.is_some() || !observer.requires_fraction());

        let copied = match observer {
            Some(observer) => {
                copy_chunked(
                    &mut body,
                    &mut writer,
                    request.chunk_size(),
                    |bytes| observer.on_progress(ProgressSample::new(bytes, total_bytes)),
                    cancel,
                )
                .await
            }
            None => {
                debug!("streaming without progress instrumentation");
                copy_chunked(&mut body, &mut writer, request.chunk_size(), |_| {}, cancel).await
            }
        };

        // Release the connection first; it must close even if the file does not.
        drop(body);

        let bytes_transferred = match copied {
            Ok(bytes) => bytes,
            Err(error) => {
                close_after_failure(&mut writer, path).await;
                return Err(map_copy_error(error, url, path, request.timeout()));
            }
        };

        writer
            .shutdown()
            .await
            .map_err(|e| DownloadError::io(path, e))?;

        info!(
            path = %path.display(),
            bytes = bytes_transferred,
            ?total_bytes,
            "download complete"
        );

        Ok(DownloadOutcome {
            path: path.to_path_buf(),
            bytes_transferred,
            total_bytes,
        })
    }

    /// Sends the GET and waits for headers only.
    async fn connect(
        &self,
        url: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<reqwest::Response, DownloadError> {
        let send = self.client.get(url).timeout(timeout).send();

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::cancelled(url, 0)),
            result = send => result.map_err(|e| {
                if e.is_timeout() {
                    DownloadError::timeout(url, timeout, 0)
                } else {
                    DownloadError::network(url, e)
                }
            })?,
        };

        if !response.status().is_success() {
            return Err(DownloadError::http_status(url, response.status().as_u16()));
        }

        Ok(response)
    }
}

/// Cancels a child of the caller's token once `timeout` elapses.
///
/// `fired` is set only when the timer is what cancelled the token; a caller
/// cancellation that got there first leaves it false. Dropping the guard
/// stops the timer.
struct Deadline {
    token: CancellationToken,
    fired: Arc<AtomicBool>,
    timer: JoinHandle<()>,
}

impl Deadline {
    fn arm(parent: &CancellationToken, timeout: Duration) -> Self {
        let token = parent.child_token();
        let fired = Arc::new(AtomicBool::new(false));
        let timer = tokio::spawn({
            let token = token.clone();
            let fired = Arc::clone(&fired);
            async move {
                tokio::time::sleep(timeout).await;
                if !token.is_cancelled() {
                    fired.store(true, Ordering::SeqCst);
                    token.cancel();
                }
            }
        });
        Self {
            token,
            fired,
            timer,
        }
    }

    fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

fn validate_request(request: &DownloadRequest) -> Result<(), DownloadError> {
    if request.chunk_size() == 0 {
        return Err(DownloadError::invalid_argument("chunk size must be positive"));
    }
    if request.timeout().is_zero() {
        return Err(DownloadError::invalid_argument("timeout must be positive"));
    }

    let parsed = Url::parse(request.url()).map_err(|e| {
        DownloadError::invalid_argument(format!("malformed URL '{}': {e}", request.url()))
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(DownloadError::invalid_argument(format!(
            "unsupported URL scheme '{}'",
            parsed.scheme()
        )));
    }
    Ok(())
}

fn build_client(connect_timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
        .build()
}

fn declared_content_length(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// Keeps transport timeouts recognisable after the body is wrapped as `AsyncRead`.
fn body_error_to_io(error: reqwest::Error) -> std::io::Error {
    if error.is_timeout() {
        std::io::Error::new(std::io::ErrorKind::TimedOut, error)
    } else {
        std::io::Error::other(error)
    }
}

fn map_copy_error(error: CopyError, url: &str, path: &Path, timeout: Duration) -> DownloadError {
    match error {
        CopyError::InvalidArgument(reason) => DownloadError::invalid_argument(reason),
        CopyError::Read {
            bytes_copied,
            source,
        } if source.kind() == std::io::ErrorKind::TimedOut => {
            DownloadError::timeout(url, timeout, bytes_copied)
        }
        CopyError::Read {
            bytes_copied,
            source,
        } => DownloadError::body_read(url, bytes_copied, source),
        CopyError::Write { source, .. } => DownloadError::io(path, source),
        CopyError::Cancelled { bytes_copied } => DownloadError::cancelled(url, bytes_copied),
    }
}

/// Flushes and closes the destination on an error path; the original error wins.
async fn close_after_failure<W>(writer: &mut W, path: &Path)
where
    W: AsyncWrite + Unpin,
{
    if let Err(error) = writer.shutdown().await {
        warn!(path = %path.display(), error = %error, "failed to close destination after error");
    }
}
