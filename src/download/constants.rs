//! Constants for the download module (chunking, timeouts).

use std::time::Duration;

/// Default copy chunk size in bytes (80 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 81_920;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default bound on a whole download, connect through last byte (10 minutes).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Bytes per megabyte used for progress labels.
pub const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;
