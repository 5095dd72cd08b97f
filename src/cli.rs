//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use streamget_core::DEFAULT_CHUNK_SIZE;

pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 600;
pub(crate) const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
pub(crate) const MAX_CHUNK_SIZE: u64 = 16 * 1024 * 1024;

/// Stream a single large file over HTTP(S) to disk with live progress.
///
/// The URL must start with an allowed prefix (see --allow-prefix). Press
/// Ctrl-C to cancel; the partial file is left in place.
#[derive(Parser, Debug)]
#[command(name = "streamget")]
#[command(author, version, about)]
pub struct Args {
    /// URL to download
    pub url: String,

    /// Destination file (created or truncated; parent directory must exist)
    pub destination: PathBuf,

    /// Allowed URL prefix; may be repeated (overrides the config file)
    #[arg(short = 'a', long = "allow-prefix", value_name = "PREFIX")]
    pub allow_prefix: Vec<String>,

    /// Bound on the whole download in seconds, connect through last byte (1-86400)
    #[arg(short = 't', long, default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=86_400))]
    pub timeout_secs: u64,

    /// Connect timeout in seconds (1-3600)
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout_secs: u64,

    /// Copy chunk size in bytes (1-16777216)
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE as u64, value_parser = clap::value_parser!(u64).range(1..=MAX_CHUNK_SIZE))]
    pub chunk_size: u64,

    /// Print progress samples as JSON lines on stdout instead of a progress bar
    #[arg(long)]
    pub json: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long)]
    pub no_color: bool,
}
