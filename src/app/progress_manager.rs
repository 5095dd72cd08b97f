//! Progress rendering for a download run.
//!
//! Samples arrive over the channel fed by a `ChannelObserver`; this task is
//! the only place that touches the terminal while the download runs.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use streamget_core::ProgressSample;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

/// How samples are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProgressMode {
    /// Percent bar (or byte spinner when the size is unknown) on stderr.
    Bar,
    /// One JSON object per sample on stdout.
    Json,
    /// Samples are drained and discarded.
    Hidden,
}

/// Terminal capabilities read once from the environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TerminalEnv {
    /// `NO_COLOR` is set to a non-empty value.
    pub(crate) no_color: bool,
    /// `TERM=dumb`: no cursor movement, so no bar.
    pub(crate) dumb: bool,
}

impl TerminalEnv {
    pub(crate) fn from_env() -> Self {
        Self {
            no_color: std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty()),
            dumb: std::env::var("TERM").is_ok_and(|term| term.eq_ignore_ascii_case("dumb")),
        }
    }

    /// Whether log lines may carry ANSI colour.
    pub(crate) fn ansi_logs(self, no_color_flag: bool) -> bool {
        !(no_color_flag || self.no_color || self.dumb)
    }
}

pub(crate) fn select_progress_mode(
    json: bool,
    stderr_is_terminal: bool,
    quiet: bool,
    env: TerminalEnv,
) -> ProgressMode {
    if json {
        ProgressMode::Json
    } else if stderr_is_terminal && !quiet && !env.dumb {
        ProgressMode::Bar
    } else {
        ProgressMode::Hidden
    }
}

/// Spawns the consumer task; it ends when the sending observer is dropped.
pub(crate) fn spawn_progress_ui(
    mode: ProgressMode,
    mut samples: UnboundedReceiver<ProgressSample>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match mode {
            ProgressMode::Bar => render_bar(samples).await,
            ProgressMode::Json => {
                while let Some(sample) = samples.recv().await {
                    if let Ok(line) = serde_json::to_string(&sample) {
                        println!("{line}");
                    }
                }
            }
            ProgressMode::Hidden => while samples.recv().await.is_some() {},
        }
    })
}

async fn render_bar(mut samples: UnboundedReceiver<ProgressSample>) {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {percent:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_message("Starting...");
    let mut sized: Option<bool> = None;

    while let Some(sample) = samples.recv().await {
        match (sized, sample.percent()) {
            (None, None) => {
                bar.set_style(
                    ProgressStyle::with_template("{spinner} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar.enable_steady_tick(Duration::from_millis(100));
                sized = Some(false);
            }
            (None, Some(_)) => sized = Some(true),
            _ => {}
        }

        if let Some(percent) = sample.percent() {
            bar.set_position(bar_position(percent));
        }
        bar.set_message(progress_label(&sample));
    }

    bar.finish_and_clear();
}

/// Maps an unclamped percentage onto the 0..=100 bar.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bar_position(percent: f64) -> u64 {
    percent.round().clamp(0.0, 100.0) as u64
}

/// "12.5MB of 40MB", or "12.5MB" when the size is unknown.
pub(crate) fn progress_label(sample: &ProgressSample) -> String {
    match sample.total_megabytes() {
        Some(total) => format!("{}MB of {}MB", sample.transferred_megabytes(), total),
        None => format!("{}MB", sample.transferred_megabytes()),
    }
}
