//! Streaming single-file download engine.
//!
//! This module downloads one HTTP/HTTPS resource to a local file while
//! reporting progress and honouring cancellation.
//!
//! # Features
//!
//! - Bounded-memory streaming through a reusable chunk buffer
//! - Progress samples normalized against `Content-Length` when the server sends it
//! - Cooperative cancellation via [`CancellationToken`](tokio_util::sync::CancellationToken)
//! - A whole-call timeout that cleans up exactly like cancellation
//! - Exclusive destination access through an advisory file lock
//!
//! # Example
//!
//! ```no_run
//! use streamget_core::download::{ChannelObserver, DownloadRequest, HttpClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let (observer, mut samples) = ChannelObserver::new();
//! let render = tokio::spawn(async move {
//!     while let Some(sample) = samples.recv().await {
//!         println!("{} bytes", sample.bytes_transferred());
//!     }
//! });
//!
//! let request = DownloadRequest::new("https://example.com/big.iso", "big.iso")
//!     .with_observer(observer);
//! client.download(request).await?;
//! render.await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
pub mod copier;
mod destination;
mod error;
mod progress;
mod request;

pub use client::{DownloadOutcome, HttpClient};
pub use constants::{CONNECT_TIMEOUT_SECS, DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT};
pub use copier::{CopyError, copy_chunked};
pub use error::{DownloadError, ErrorKind};
pub use progress::{ChannelObserver, ProgressObserver, ProgressSample};
pub use request::DownloadRequest;

// Note: Per project convention, we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
