//! Error types for the download module.
//!
//! Every failure maps onto exactly one [`ErrorKind`], which is what callers
//! (the CLI, a GUI) switch on. The variants themselves carry the context
//! needed for a human-readable message.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Coarse classification of a download failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed call parameters (zero chunk size, unusable URL).
    InvalidArgument,
    /// Destination could not be opened exclusively for writing.
    DestinationUnavailable,
    /// Request could not be established or returned a non-success status.
    ConnectFailure,
    /// A read or write failed after the transfer started.
    IoFailure,
    /// Cancellation was signalled.
    Cancelled,
    /// The configured time bound was exceeded.
    Timeout,
}

impl ErrorKind {
    /// Returns the stable label used in diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid-argument",
            Self::DestinationUnavailable => "destination-unavailable",
            Self::ConnectFailure => "connect-failure",
            Self::IoFailure => "io-failure",
            Self::Cancelled => "cancelled",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during a download.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// A request parameter is unusable.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the request.
        reason: String,
    },

    /// The destination path could not be created or is held by another writer.
    #[error("destination unavailable: {path}: {source}")]
    DestinationUnavailable {
        /// The destination path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// Network-level error before the body started (DNS, refused, TLS, ...).
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Reading the response body failed mid-transfer.
    #[error("error reading response body from {url} after {bytes_transferred} bytes: {source}")]
    BodyRead {
        /// The URL being downloaded.
        url: String,
        /// Bytes written before the failure.
        bytes_transferred: u64,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Writing or closing the destination failed.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The destination path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The download was cancelled by the caller.
    #[error("download of {url} cancelled after {bytes_transferred} bytes")]
    Cancelled {
        /// The URL being downloaded.
        url: String,
        /// Bytes written before cancellation took effect.
        bytes_transferred: u64,
    },

    /// The download exceeded its time bound.
    #[error("download of {url} timed out after {}s ({bytes_transferred} bytes written)", .timeout.as_secs())]
    Timeout {
        /// The URL being downloaded.
        url: String,
        /// The configured bound.
        timeout: Duration,
        /// Bytes written before the deadline.
        bytes_transferred: u64,
    },
}

impl DownloadError {
    /// Creates an invalid-argument error.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Creates a destination-unavailable error.
    pub fn destination_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DestinationUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a body-read error.
    pub fn body_read(url: impl Into<String>, bytes_transferred: u64, source: std::io::Error) -> Self {
        Self::BodyRead {
            url: url.into(),
            bytes_transferred,
            source,
        }
    }

    /// Creates a destination IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a cancellation error.
    pub fn cancelled(url: impl Into<String>, bytes_transferred: u64) -> Self {
        Self::Cancelled {
            url: url.into(),
            bytes_transferred,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>, timeout: Duration, bytes_transferred: u64) -> Self {
        Self::Timeout {
            url: url.into(),
            timeout,
            bytes_transferred,
        }
    }

    /// Returns the classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::DestinationUnavailable { .. } => ErrorKind::DestinationUnavailable,
            Self::ClientBuild { .. } | Self::Network { .. } | Self::HttpStatus { .. } => {
                ErrorKind::ConnectFailure
            }
            Self::BodyRead { .. } | Self::Io { .. } => ErrorKind::IoFailure,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// Returns true for `Cancelled` and `Timeout`, which share cleanup semantics.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self.kind(), ErrorKind::Cancelled | ErrorKind::Timeout)
    }
}

// No From<reqwest::Error> / From<std::io::Error>: every variant needs a url or
// path that the source error does not carry.
