//! Test helpers: recording sink, scripted prompt and a settable playback signal.
//!
//! Run from workspace root: `cargo test -p vidhost-client`.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vidhost_client::ApiClient;
use vidhost_core::models::EngagementState;
use vidhost_core::{ClientConfig, ConfirmPrompt, EngagementAction, PlaybackSignal, UiSink};

/// Everything a [`RecordingSink`] was asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Progress(f64),
    HideProgress,
    Status(String),
    Selection(Option<String>),
    ControlsEnabled(bool),
    ShowSurface,
    Navigate(String),
    Engagement { liked: bool, like_count: u64 },
    ActionEnabled(EngagementAction, bool),
    ClearComment,
    Refresh,
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, event: SinkEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Status(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self) -> Option<String> {
        self.statuses().pop()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Navigate(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn contains(&self, event: &SinkEvent) -> bool {
        self.events().contains(event)
    }
}

impl UiSink for RecordingSink {
    fn render_progress(&self, fraction: f64) {
        self.push(SinkEvent::Progress(fraction));
    }

    fn hide_progress(&self) {
        self.push(SinkEvent::HideProgress);
    }

    fn render_status(&self, text: &str) {
        self.push(SinkEvent::Status(text.to_string()));
    }

    fn render_selection(&self, display_name: Option<&str>) {
        self.push(SinkEvent::Selection(display_name.map(str::to_string)));
    }

    fn set_controls_enabled(&self, enabled: bool) {
        self.push(SinkEvent::ControlsEnabled(enabled));
    }

    fn show_upload_surface(&self) {
        self.push(SinkEvent::ShowSurface);
    }

    fn navigate(&self, url: &str) {
        self.push(SinkEvent::Navigate(url.to_string()));
    }

    fn render_engagement(&self, state: &EngagementState) {
        self.push(SinkEvent::Engagement {
            liked: state.liked,
            like_count: state.like_count,
        });
    }

    fn set_action_enabled(&self, action: EngagementAction, enabled: bool) {
        self.push(SinkEvent::ActionEnabled(action, enabled));
    }

    fn clear_comment_input(&self) {
        self.push(SinkEvent::ClearComment);
    }

    fn refresh(&self) {
        self.push(SinkEvent::Refresh);
    }
}

/// Confirmation gate with a fixed answer that remembers what it was asked.
pub struct ScriptedPrompt {
    answer: bool,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConfirmPrompt for ScriptedPrompt {
    async fn confirm(&self, message: &str) -> bool {
        self.asked.lock().unwrap().push(message.to_string());
        self.answer
    }
}

/// Playback signal whose values the test sets directly.
pub struct FakeSignal {
    play_time: AtomicU64,
    duration: AtomicU64,
}

impl FakeSignal {
    pub fn new(play_time: f64, duration: f64) -> Arc<Self> {
        Arc::new(Self {
            play_time: AtomicU64::new(play_time.to_bits()),
            duration: AtomicU64::new(duration.to_bits()),
        })
    }

    pub fn set(&self, play_time: f64, duration: f64) {
        self.play_time.store(play_time.to_bits(), Ordering::SeqCst);
        self.duration.store(duration.to_bits(), Ordering::SeqCst);
    }
}

impl PlaybackSignal for FakeSignal {
    fn play_time(&self) -> f64 {
        f64::from_bits(self.play_time.load(Ordering::SeqCst))
    }

    fn seekable_duration(&self) -> f64 {
        f64::from_bits(self.duration.load(Ordering::SeqCst))
    }
}

/// Client config pointed at a mock server, without the post-upload redirect delay.
pub fn test_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        redirect_delay: Duration::ZERO,
        request_timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        watch_poll_interval: Duration::from_millis(10),
        ..ClientConfig::with_base_url(base_url)
    }
}

pub fn test_api(base_url: &str) -> ApiClient {
    ApiClient::new(test_config(base_url)).expect("valid test config")
}
