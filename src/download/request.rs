//! Per-call download parameters.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT};
use super::progress::ProgressObserver;

/// Parameters for one [`HttpClient::download`](super::HttpClient::download) call.
///
/// A request is consumed by the download; build a new one per attempt.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use streamget_core::download::{DownloadRequest, ProgressSample};
/// use tokio_util::sync::CancellationToken;
///
/// let cancel = CancellationToken::new();
/// let request = DownloadRequest::new("https://example.com/big.iso", "big.iso")
///     .with_observer(|sample: ProgressSample| println!("{:?}", sample.fraction()))
///     .with_cancellation(cancel.clone())
///     .with_timeout(Duration::from_secs(60));
/// assert_eq!(request.url(), "https://example.com/big.iso");
/// ```
pub struct DownloadRequest {
    url: String,
    destination: PathBuf,
    observer: Option<Arc<dyn ProgressObserver>>,
    cancel: CancellationToken,
    timeout: Duration,
    chunk_size: usize,
}

impl DownloadRequest {
    /// Creates a request with no observer, a fresh token and default limits.
    #[must_use]
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            observer: None,
            cancel: CancellationToken::new(),
            timeout: DEFAULT_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Sets the progress observer.
    #[must_use]
    pub fn with_observer(mut self, observer: impl ProgressObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Uses `cancel` instead of a private token, so another task can stop the download.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Bounds the whole call, connect through last byte.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the copy chunk size in bytes.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Source URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Destination path.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Cancellation token shared with the caller.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whole-call time bound.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Copy chunk size in bytes.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub(crate) fn observer(&self) -> Option<&Arc<dyn ProgressObserver>> {
        self.observer.as_ref()
    }
}

impl fmt::Debug for DownloadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadRequest")
            .field("url", &self.url)
            .field("destination", &self.destination)
            .field("has_observer", &self.observer.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .field("timeout", &self.timeout)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::ProgressSample;

    #[test]
    fn test_request_defaults() {
        let request = DownloadRequest::new("https://example.com/a.zip", "a.zip");
        assert_eq!(request.url(), "https://example.com/a.zip");
        assert_eq!(request.destination(), Path::new("a.zip"));
        assert_eq!(request.chunk_size(), DEFAULT_CHUNK_SIZE);
        assert_eq!(request.timeout(), DEFAULT_TIMEOUT);
        assert!(request.observer().is_none());
        assert!(!request.cancellation().is_cancelled());
    }

    #[test]
    fn test_request_shares_cancellation_with_caller() {
        let cancel = CancellationToken::new();
        let request =
            DownloadRequest::new("https://example.com/a.zip", "a.zip").with_cancellation(cancel.clone());

        cancel.cancel();
        assert!(request.cancellation().is_cancelled());
    }

    #[test]
    fn test_request_builder_overrides() {
        let request = DownloadRequest::new("https://example.com/a.zip", "a.zip")
            .with_observer(|_: ProgressSample| {})
            .with_timeout(Duration::from_secs(5))
            .with_chunk_size(1024);

        assert!(request.observer().is_some());
        assert_eq!(request.timeout(), Duration::from_secs(5));
        assert_eq!(request.chunk_size(), 1024);

        let debug = format!("{request:?}");
        assert!(debug.contains("has_observer: true"), "{debug}");
    }
}
