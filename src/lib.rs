//! Streamget Core Library
//!
//! This library downloads a single large file over HTTP(S) to local storage,
//! reporting incremental progress to an observer and supporting cancellation
//! mid-transfer.
//!
//! # Architecture
//!
//! - [`download::copier`] - chunked async copy with per-chunk callbacks
//! - [`download::HttpClient`] - connects, sizes and streams one request to disk
//! - [`download::ProgressSample`] / [`download::ProgressObserver`] - progress events
//!
//! Rendering, argument parsing and URL allow-listing live in the binary.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
mod user_agent;

// Re-export commonly used types
pub use download::{
    ChannelObserver, DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT, DownloadError, DownloadOutcome,
    DownloadRequest, ErrorKind, HttpClient, ProgressObserver, ProgressSample,
};
pub use tokio_util::sync::CancellationToken;
