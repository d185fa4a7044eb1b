//! Watch-threshold tracker.
//!
//! Polls the player until enough of the video has been played, then records a
//! single view and stops for good. The decision itself is [`WatchThreshold`];
//! [`WatchTracker`] is the polling task around it.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use vidhost_core::{ClientConfig, ClientResult, PlaybackSignal};

/// Sends the record-view request for a resource.
#[async_trait]
pub trait ViewRecorder: Send + Sync {
    /// Returns `Ok(false)` when the view had already been counted.
    async fn record_view(&self, resource_id: &str) -> ClientResult<bool>;
}

/// Single-shot threshold on `play_time / seekable_duration`.
#[derive(Debug, Clone)]
pub struct WatchThreshold {
    threshold: f64,
    fired: bool,
}

impl WatchThreshold {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            fired: false,
        }
    }

    /// Watched fraction, or `None` while the duration is unknown.
    pub fn fraction(play_time: f64, seekable_duration: f64) -> Option<f64> {
        if seekable_duration > 0.0 && seekable_duration.is_finite() && play_time.is_finite() {
            Some(play_time / seekable_duration)
        } else {
            None
        }
    }

    /// Feed one sample. Returns true exactly once: on the first sample whose
    /// fraction is strictly above the threshold.
    pub fn observe(&mut self, play_time: f64, seekable_duration: f64) -> bool {
        if self.fired {
            return false;
        }
        match Self::fraction(play_time, seekable_duration) {
            Some(fraction) if fraction > self.threshold => {
                self.fired = true;
                true
            }
            _ => false,
        }
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

/// How the tracker task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerExit {
    /// The threshold was crossed and the record-view request was sent.
    Fired,
    /// Stopped before the threshold was crossed.
    Cancelled,
}

/// Handle to a running tracker. Dropping it stops the task at its next poll.
pub struct WatchTracker {
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<TrackerExit>,
    fired: Arc<AtomicBool>,
}

impl WatchTracker {
    /// Start tracking playback of `resource_id`. Call once the media has loaded.
    pub fn start(
        resource_id: impl Into<String>,
        signal: Arc<dyn PlaybackSignal>,
        recorder: Arc<dyn ViewRecorder>,
        config: &ClientConfig,
    ) -> Self {
        let resource_id = resource_id.into();
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let fired = Arc::new(AtomicBool::new(false));
        let fired_flag = Arc::clone(&fired);
        let mut threshold = WatchThreshold::new(config.watch_threshold);
        let poll_interval = config.watch_poll_interval;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            tracing::debug!(resource_id = %resource_id, "Watch tracker started");

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        tracing::debug!(resource_id = %resource_id, "Watch tracker cancelled");
                        return TrackerExit::Cancelled;
                    }
                    _ = interval.tick() => {
                        let play_time = signal.play_time();
                        let duration = signal.seekable_duration();
                        if !threshold.observe(play_time, duration) {
                            continue;
                        }

                        fired_flag.store(true, Ordering::SeqCst);
                        match recorder.record_view(&resource_id).await {
                            Ok(recorded) => tracing::info!(
                                resource_id = %resource_id,
                                play_time,
                                duration,
                                recorded,
                                "Watch threshold reached"
                            ),
                            Err(e) => tracing::warn!(
                                resource_id = %resource_id,
                                error = %e,
                                "Failed to record view"
                            ),
                        }
                        return TrackerExit::Fired;
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            handle,
            fired,
        }
    }

    /// True once the threshold has been crossed.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Stop polling (page teardown). A record-view request already under way
    /// is allowed to finish.
    pub async fn cancel(self) -> TrackerExit {
        let _ = self.shutdown_tx.send(()).await;
        join(self.handle).await
    }

    /// Wait for the tracker to stop on its own.
    pub async fn finished(self) -> TrackerExit {
        let Self {
            shutdown_tx,
            handle,
            ..
        } = self;
        let exit = join(handle).await;
        drop(shutdown_tx);
        exit
    }
}

async fn join(handle: JoinHandle<TrackerExit>) -> TrackerExit {
    match handle.await {
        Ok(exit) => exit,
        Err(e) => {
            tracing::error!(error = %e, "Watch tracker task failed");
            TrackerExit::Cancelled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, AtomicUsize};
    use std::time::Duration;

    struct Signal {
        play_time: AtomicU64,
        duration: AtomicU64,
    }

    impl Signal {
        fn new(play_time: f64, duration: f64) -> Arc<Self> {
            Arc::new(Self {
                play_time: AtomicU64::new(play_time.to_bits()),
                duration: AtomicU64::new(duration.to_bits()),
            })
        }

        fn set_play_time(&self, play_time: f64) {
            self.play_time.store(play_time.to_bits(), Ordering::SeqCst);
        }
    }

    impl PlaybackSignal for Signal {
        fn play_time(&self) -> f64 {
            f64::from_bits(self.play_time.load(Ordering::SeqCst))
        }

        fn seekable_duration(&self) -> f64 {
            f64::from_bits(self.duration.load(Ordering::SeqCst))
        }
    }

    #[derive(Default)]
    struct CountingRecorder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ViewRecorder for CountingRecorder {
        async fn record_view(&self, _resource_id: &str) -> ClientResult<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    fn config() -> ClientConfig {
        ClientConfig {
            watch_threshold: 0.15,
            watch_poll_interval: Duration::from_secs(1),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn threshold_is_strict_and_single_shot() {
        let mut threshold = WatchThreshold::new(0.15);
        assert!(!threshold.observe(0.0, 100.0));
        assert!(!threshold.observe(15.0, 100.0));
        assert!(threshold.observe(15.1, 100.0));
        assert!(threshold.has_fired());
        assert!(!threshold.observe(90.0, 100.0));
    }

    #[test]
    fn threshold_waits_for_a_known_duration() {
        let mut threshold = WatchThreshold::new(0.15);
        assert!(!threshold.observe(10.0, 0.0));
        assert!(!threshold.observe(10.0, f64::NAN));
        assert!(!threshold.observe(10.0, f64::INFINITY));
        assert_eq!(WatchThreshold::fraction(5.0, 0.0), None);
        assert_eq!(WatchThreshold::fraction(5.0, 10.0), Some(0.5));
    }

    #[tokio::test(start_paused = true)]
    async fn tracker_fires_once_then_stops() {
        let signal = Signal::new(0.0, 100.0);
        let recorder = Arc::new(CountingRecorder::default());
        let tracker = WatchTracker::start("abc", signal.clone(), recorder.clone(), &config());

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert!(!tracker.has_fired());

        signal.set_play_time(20.0);
        assert_eq!(tracker.finished().await, TrackerExit::Fired);
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_tracker_never_records() {
        let signal = Signal::new(5.0, 100.0);
        let recorder = Arc::new(CountingRecorder::default());
        let tracker = WatchTracker::start("abc", signal.clone(), recorder.clone(), &config());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(tracker.cancel().await, TrackerExit::Cancelled);

        signal.set_play_time(90.0);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    }
}
