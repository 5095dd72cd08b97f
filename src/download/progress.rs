//! Progress samples and the observer capability that receives them.

use serde::Serialize;
use tokio::sync::mpsc;

use super::constants::BYTES_PER_MEGABYTE;

/// One observed point in a transfer.
///
/// `fraction` is computed once at construction and never clamped: if a
/// server understates its `Content-Length`, values above `1.0` reach the
/// observer unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSample {
    bytes_transferred: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fraction: Option<f64>,
}

impl ProgressSample {
    /// Builds a sample from a cumulative byte count and an optional total.
    ///
    /// A declared total of zero yields no fraction.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(bytes_transferred: u64, total_bytes: Option<u64>) -> Self {
        let fraction = total_bytes
            .filter(|&total| total > 0)
            .map(|total| bytes_transferred as f64 / total as f64);
        Self {
            bytes_transferred,
            total_bytes,
            fraction,
        }
    }

    /// Cumulative bytes written so far.
    #[must_use]
    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    /// Declared content length, when the server reported one.
    #[must_use]
    pub fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }

    /// `bytes_transferred / total_bytes` in `[0, 1]` for accurate servers.
    #[must_use]
    pub fn fraction(&self) -> Option<f64> {
        self.fraction
    }

    /// Fraction scaled to `0..=100` for display.
    #[must_use]
    pub fn percent(&self) -> Option<f64> {
        self.fraction.map(|fraction| fraction * 100.0)
    }

    /// Bytes transferred in megabytes, rounded to two decimals.
    #[must_use]
    pub fn transferred_megabytes(&self) -> f64 {
        to_megabytes(self.bytes_transferred)
    }

    /// Declared total in megabytes, rounded to two decimals.
    #[must_use]
    pub fn total_megabytes(&self) -> Option<f64> {
        self.total_bytes.map(to_megabytes)
    }
}

#[allow(clippy::cast_precision_loss)]
fn to_megabytes(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_MEGABYTE * 100.0).round() / 100.0
}

/// Receives progress samples from a running download.
///
/// Calls are sequential and in increasing byte order for one download.
/// Implementations must return quickly; anything that needs a specific
/// execution context (a UI thread, a render loop) should forward the sample,
/// as [`ChannelObserver`] does.
pub trait ProgressObserver: Send + Sync {
    /// Called after each chunk has been written to the destination.
    fn on_progress(&self, sample: ProgressSample);

    /// Whether samples without a fraction are useless to this observer.
    ///
    /// When this returns true and the server sends no content length, the
    /// download runs without progress instrumentation.
    fn requires_fraction(&self) -> bool {
        false
    }
}

impl<F> ProgressObserver for F
where
    F: Fn(ProgressSample) + Send + Sync,
{
    fn on_progress(&self, sample: ProgressSample) {
        self(sample);
    }
}

/// Observer that hands samples to another task over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<ProgressSample>,
    requires_fraction: bool,
}

impl ChannelObserver {
    /// Creates an observer and the receiving end for the consumer.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressSample>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                requires_fraction: false,
            },
            receiver,
        )
    }

    /// Marks this observer as useless without a known total.
    #[must_use]
    pub fn requiring_fraction(mut self) -> Self {
        self.requires_fraction = true;
        self
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_progress(&self, sample: ProgressSample) {
        // Receiver gone means the consumer stopped rendering; the transfer goes on.
        let _ = self.sender.send(sample);
    }

    fn requires_fraction(&self) -> bool {
        self.requires_fraction
    }
}
