//! Terminal implementations of the presentation seams.

use async_trait::async_trait;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;

use vidhost_core::models::{EngagementState, NO_SELECTION_TEXT};
use vidhost_core::{ConfirmPrompt, EngagementAction, PlaybackSignal, UiSink};

const PROGRESS_WIDTH: usize = 30;

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Render a fraction as `[#####     ]  50%`.
pub fn progress_bar(fraction: f64) -> String {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (fraction * PROGRESS_WIDTH as f64).round() as usize;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        " ".repeat(PROGRESS_WIDTH - filled),
        (fraction * 100.0).round() as u32
    )
}

/// True for "y" or "yes", case-insensitive.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Sink that writes to stderr and remembers where it was told to go.
#[derive(Default)]
pub struct TerminalSink {
    progress_visible: AtomicBool,
    location: Mutex<Option<String>>,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last navigation target, if any.
    pub fn location(&self) -> Option<String> {
        self.location
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn end_progress_line(&self) {
        if self.progress_visible.swap(false, Ordering::SeqCst) {
            eprintln!();
        }
    }
}

impl UiSink for TerminalSink {
    fn render_progress(&self, fraction: f64) {
        self.progress_visible.store(true, Ordering::SeqCst);
        eprint!("\r{}", progress_bar(fraction));
        let _ = std::io::stderr().flush();
    }

    fn hide_progress(&self) {
        self.end_progress_line();
    }

    fn render_status(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.progress_visible.load(Ordering::SeqCst) {
            // The bar already shows the percentage.
            if text.starts_with("Uploading") {
                return;
            }
            self.end_progress_line();
        }
        eprintln!("{}", text);
    }

    fn render_selection(&self, display_name: Option<&str>) {
        match display_name {
            Some(name) => eprintln!("Selected {}", name),
            None => tracing::debug!("{}", NO_SELECTION_TEXT),
        }
    }

    fn set_controls_enabled(&self, enabled: bool) {
        tracing::trace!(enabled, "Upload controls toggled");
    }

    fn navigate(&self, url: &str) {
        self.end_progress_line();
        *self
            .location
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(url.to_string());
    }

    fn render_engagement(&self, state: &EngagementState) {
        eprintln!(
            "{} like(s){}",
            state.like_count,
            if state.liked { ", liked by you" } else { "" }
        );
    }

    fn set_action_enabled(&self, action: EngagementAction, enabled: bool) {
        tracing::trace!(action = %action, enabled, "Action toggled");
    }
}

/// Asks on stderr and reads the answer from stdin.
pub struct StdinConfirm;

#[async_trait]
impl ConfirmPrompt for StdinConfirm {
    async fn confirm(&self, message: &str) -> bool {
        eprint!("{} [y/N] ", message);
        let _ = std::io::stderr().flush();

        let mut line = String::new();
        match BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
            Ok(_) => is_affirmative(&line),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read confirmation");
                false
            }
        }
    }
}

/// Playback that advances with the clock at `rate` times real speed.
pub struct SimulatedPlayback {
    started: Instant,
    duration: f64,
    rate: f64,
}

impl SimulatedPlayback {
    pub fn new(duration: f64, rate: f64) -> Self {
        Self {
            started: Instant::now(),
            duration,
            rate,
        }
    }
}

impl PlaybackSignal for SimulatedPlayback {
    fn play_time(&self) -> f64 {
        (self.started.elapsed().as_secs_f64() * self.rate).min(self.duration)
    }

    fn seekable_duration(&self) -> f64 {
        self.duration
    }
}
