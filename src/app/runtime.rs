use std::io::{self, IsTerminal};
use std::time::Duration;

use anyhow::{Context, Result};
use streamget_core::{CancellationToken, ChannelObserver, DownloadRequest, HttpClient};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::ProcessExit;
use crate::app::{config_runtime, exit_handler, progress_manager, validation};
use crate::app_config;

pub(crate) async fn run_streamget() -> Result<ProcessExit> {
    let (args, cli_sources) = config_runtime::parse_cli_with_sources();

    let loaded = app_config::load_default_file_config()?;
    let args = config_runtime::apply_config_defaults(args, &cli_sources, loaded.config.as_ref())?;

    let default_level = config_runtime::resolve_default_log_level(&args);
    let force_cli_log_level = config_runtime::should_force_cli_log_level(&cli_sources);
    let terminal = progress_manager::TerminalEnv::from_env();
    init_tracing(default_level, force_cli_log_level, terminal.ansi_logs(args.no_color));

    debug!(?args, "CLI arguments parsed");
    if loaded.config.is_some()
        && let Some(path) = loaded.path.as_deref()
    {
        debug!(path = %path.display(), "Loaded config file");
    }

    let allowed_prefixes = config_runtime::resolve_allowed_prefixes(&args, loaded.config.as_ref());
    validation::validate_download_url(&args.url, &allowed_prefixes)?;

    info!("Writing file to: {}", args.destination.display());

    let client = HttpClient::with_connect_timeout(Duration::from_secs(args.connect_timeout_secs))?;
    let chunk_size = usize::try_from(args.chunk_size).context("chunk size does not fit in memory")?;

    let cancel = CancellationToken::new();
    let interrupt = spawn_interrupt_handler(cancel.clone());

    let (observer, samples) = ChannelObserver::new();
    let mode = progress_manager::select_progress_mode(
        args.json,
        io::stderr().is_terminal(),
        args.quiet,
        terminal,
    );
    let progress_ui = progress_manager::spawn_progress_ui(mode, samples);

    let request = DownloadRequest::new(args.url.as_str(), args.destination.as_path())
        .with_observer(observer)
        .with_cancellation(cancel)
        .with_timeout(Duration::from_secs(args.timeout_secs))
        .with_chunk_size(chunk_size);

    let result = client.download(request).await;

    interrupt.abort();
    // The observer was dropped with the request, so the UI task drains and exits.
    if let Err(error) = progress_ui.await {
        warn!(error = %error, "progress display task failed");
    }

    Ok(exit_handler::report_outcome(&result))
}

/// Logs go to stderr so stdout stays clean for `--json`. `RUST_LOG` wins
/// unless `-v`/`-q` was given explicitly.
fn init_tracing(default_level: &str, force_cli_level: bool, ansi: bool) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) if !force_cli_level => from_env,
        _ => EnvFilter::new(default_level),
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_ansi(ansi)
        .with_env_filter(filter)
        .try_init();
}

/// Cancels the download on Ctrl-C.
fn spawn_interrupt_handler(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling download");
            cancel.cancel();
        }
    })
}
