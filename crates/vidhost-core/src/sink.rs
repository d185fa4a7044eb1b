//! Seams to the presentation layer and the media player
//!
//! The orchestration layer never touches a widget directly. Everything visible
//! goes through [`UiSink`]; destructive actions ask a [`ConfirmPrompt`]; the
//! watch tracker reads a [`PlaybackSignal`]. Front ends implement these traits.

use async_trait::async_trait;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::models::EngagementState;

/// Engagement controls that can be disabled while their request is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngagementAction {
    Like,
    Delete,
    Comment,
    View,
}

impl EngagementAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementAction::Like => "like",
            EngagementAction::Delete => "delete",
            EngagementAction::Comment => "comment",
            EngagementAction::View => "view",
        }
    }
}

impl Display for EngagementAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Render and navigate sink implemented by the presentation layer.
///
/// Calls are synchronous and must not block; they only update what is shown.
pub trait UiSink: Send + Sync {
    /// Show the upload progress bar at `fraction` (0.0..=1.0).
    fn render_progress(&self, fraction: f64);

    /// Hide the upload progress bar.
    fn hide_progress(&self);

    /// Replace the status line. An empty string clears it.
    fn render_status(&self, text: &str);

    /// Show the selected file's name, or the placeholder when `None`.
    fn render_selection(&self, display_name: Option<&str>);

    /// Enable or disable the upload form controls.
    fn set_controls_enabled(&self, enabled: bool);

    /// Make the upload surface (modal) visible.
    fn show_upload_surface(&self) {}

    /// Leave the current page for `url`.
    fn navigate(&self, url: &str);

    /// Re-render like state for a resource.
    fn render_engagement(&self, _state: &EngagementState) {}

    /// Enable or disable one engagement control.
    fn set_action_enabled(&self, _action: EngagementAction, _enabled: bool) {}

    /// Clear the comment draft input.
    fn clear_comment_input(&self) {}

    /// Reload server-rendered state (comment list and counters).
    fn refresh(&self) {}
}

/// Confirmation gate for destructive actions.
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    /// Returns true if the user accepted `message`.
    async fn confirm(&self, message: &str) -> bool;
}

/// Playback progress as reported by the media player, in seconds.
pub trait PlaybackSignal: Send + Sync {
    /// Total time actually spent playing (not the playhead position).
    fn play_time(&self) -> f64;

    /// End of the seekable range, i.e. the playable duration.
    fn seekable_duration(&self) -> f64;
}

/// Sink that renders nothing. Useful for headless runs.
pub struct NoOpSink;

impl UiSink for NoOpSink {
    fn render_progress(&self, _fraction: f64) {}

    fn hide_progress(&self) {}

    fn render_status(&self, _text: &str) {}

    fn render_selection(&self, _display_name: Option<&str>) {}

    fn set_controls_enabled(&self, _enabled: bool) {}

    fn navigate(&self, _url: &str) {}
}

/// Prompt that always answers the same way (e.g. `--yes` on the CLI).
pub struct FixedConfirm(pub bool);

#[async_trait]
impl ConfirmPrompt for FixedConfirm {
    async fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}
