//! Upload orchestrator: session → transfer → finalize → navigate.
//!
//! One orchestrator drives one upload surface. Its state is an explicit
//! [`UploadPhase`] plus the values owned by the current phase (the bound
//! session, the selected payload, the current attempt). Every transition
//! happens under the state lock, which is never held across an `.await` or a
//! sink call, so a second gesture arriving mid-flight always sees the
//! up-to-date phase.
//!
//! A future that leaves a busy phase is guarded: if it is dropped before it
//! settles (task abort, page teardown, an outer timeout), the phase rolls back
//! to `Failed` and the form is reset, so the surface never stays locked.
//!
//! ```text
//! Idle → SessionRequested → SessionReady → Transferring → TransferDone → Finalizing → Finalized
//!              └──────────────────┬──────────────┘                            │
//!                                 └──────────────→ Failed ←───────────────────┘
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use validator::Validate;

use crate::ApiClient;
use vidhost_core::models::{
    waitfor_path, AttemptOutcome, FilePayload, FinalizationRecord, UploadAttempt, UploadPhase,
    UploadSession,
};
use vidhost_core::{ClientError, ClientResult, UiSink};

pub const STATUS_UPLOADING: &str = "Uploading...";
pub const STATUS_UPLOAD_REJECTED: &str = "Upload failed. Please try again.";
pub const STATUS_UPLOAD_ERROR: &str = "An error occurred during upload.";
pub const STATUS_SESSION_MISSING: &str = "Failed to get upload URL. Please try again later.";
pub const STATUS_SESSION_ERROR: &str = "An error occurred while trying to get the upload URL.";
pub const STATUS_FINALIZED: &str =
    "Video uploaded successfully! Taking you to your future video...";
pub const STATUS_FINALIZE_FAILED: &str = "Video upload could not be completed.";

/// Result of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub upload_hash: String,
    /// Where the sink was (or will be) sent after finalization.
    pub location: String,
}

#[derive(Default)]
struct UploadState {
    phase: UploadPhase,
    session: Option<UploadSession>,
    selection: Option<FilePayload>,
    title: String,
    description: String,
    attempt: Option<UploadAttempt>,
    attempts_started: u32,
}

pub struct UploadOrchestrator {
    api: ApiClient,
    sink: Arc<dyn UiSink>,
    state: Mutex<UploadState>,
    /// Progress of the current attempt as f64 bits; written from the body stream.
    progress: Arc<AtomicU64>,
}

impl UploadOrchestrator {
    pub fn new(api: ApiClient, sink: Arc<dyn UiSink>) -> Self {
        Self {
            api,
            sink,
            state: Mutex::new(UploadState::default()),
            progress: Arc::new(AtomicU64::new(0f64.to_bits())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, UploadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> UploadPhase {
        self.lock().phase
    }

    pub fn session(&self) -> Option<UploadSession> {
        self.lock().session.clone()
    }

    /// Snapshot of the current (or last) attempt.
    pub fn current_attempt(&self) -> Option<UploadAttempt> {
        let state = self.lock();
        state.attempt.clone().map(|mut attempt| {
            if attempt.outcome == AttemptOutcome::Pending {
                attempt.progress_fraction = f64::from_bits(self.progress.load(Ordering::Relaxed));
            }
            attempt
        })
    }

    /// Open the upload surface and acquire a write target for it.
    ///
    /// The surface is shown whatever the outcome; on failure it carries a
    /// recoverable error status and no transfer is possible until a later call
    /// succeeds.
    pub async fn open_upload_surface(&self) -> ClientResult<UploadSession> {
        {
            let mut state = self.lock();
            if state.phase.is_busy() {
                return Err(ClientError::InFlight("upload"));
            }
            if let Some(session) = state.session.clone() {
                drop(state);
                self.sink.show_upload_surface();
                return Ok(session);
            }
            state.phase = UploadPhase::SessionRequested;
        }
        let _busy = BusyGuard(self);

        match self.api.acquire_upload_session().await {
            Ok(session) => {
                {
                    let mut state = self.lock();
                    state.phase = UploadPhase::SessionReady;
                    state.session = Some(session.clone());
                }
                tracing::info!(upload_hash = %session.upload_hash, "Upload session acquired");
                self.sink.show_upload_surface();
                Ok(session)
            }
            Err(e) => {
                self.lock().phase = UploadPhase::Failed;
                e.log("acquire_upload_session");
                self.sink.show_upload_surface();
                self.sink.render_status(match e {
                    ClientError::Transport(_) => STATUS_SESSION_ERROR,
                    _ => STATUS_SESSION_MISSING,
                });
                Err(e)
            }
        }
    }

    /// Record the candidate payload. No network call; valid in any phase.
    pub fn select_file(&self, payload: FilePayload) {
        let display_name = payload.display_name().to_string();
        self.lock().selection = Some(payload);
        self.sink.render_selection(Some(&display_name));
    }

    pub fn clear_selection(&self) {
        self.lock().selection = None;
        self.sink.render_selection(None);
    }

    /// Record the form fields sent at finalization.
    pub fn set_details(&self, title: &str, description: &str) {
        let mut state = self.lock();
        state.title = title.to_string();
        state.description = description.to_string();
    }

    /// Transfer the selected payload and finalize it.
    ///
    /// Rejected without side effects when an attempt is already in flight, when
    /// nothing is selected, when no session is bound, or when the form fields
    /// are invalid.
    pub async fn submit(&self) -> ClientResult<UploadReceipt> {
        let (session, payload, record, attempt) = {
            let mut state = self.lock();
            if state.phase.is_busy() {
                return Err(ClientError::InFlight("upload"));
            }
            let payload = state
                .selection
                .clone()
                .ok_or_else(|| ClientError::Validation("No file selected".to_string()))?;
            let session = state.session.clone().ok_or_else(|| {
                ClientError::Precondition("Upload session has not been acquired".to_string())
            })?;
            if !matches!(state.phase, UploadPhase::SessionReady | UploadPhase::Failed) {
                return Err(ClientError::Precondition(format!(
                    "Cannot submit while {}",
                    state.phase
                )));
            }

            let record = FinalizationRecord::new(&session, &state.title, &state.description);
            record.validate()?;

            state.attempts_started += 1;
            let content_type =
                payload.resolved_content_type(&self.api.config().default_content_type);
            let attempt = UploadAttempt::new(
                state.attempts_started,
                payload.display_name(),
                &content_type,
                payload.size(),
            );
            state.attempt = Some(attempt.clone());
            state.phase = UploadPhase::Transferring;
            (session, payload, record, attempt)
        };
        let _busy = BusyGuard(self);

        self.progress.store(0f64.to_bits(), Ordering::Relaxed);
        self.sink.set_controls_enabled(false);
        self.sink.render_progress(0.0);
        self.sink.render_status(STATUS_UPLOADING);

        tracing::info!(
            upload_hash = %session.upload_hash,
            attempt = attempt.sequence,
            file = %attempt.file_name,
            total_bytes = attempt.total_bytes,
            "Upload transfer started"
        );

        let transfer = self
            .api
            .transfer(
                &session,
                &payload,
                &attempt.content_type,
                self.progress_reporter(),
            )
            .await;

        if let Err(e) = transfer {
            self.fail_transfer(&e);
            return Err(e);
        }

        {
            let mut state = self.lock();
            if let Some(attempt) = state.attempt.as_mut() {
                attempt.outcome = AttemptOutcome::Succeeded;
                attempt.progress_fraction = 1.0;
            }
            state.phase = UploadPhase::TransferDone;
        }
        self.progress.store(1f64.to_bits(), Ordering::Relaxed);
        self.sink.render_progress(1.0);

        self.finalize(session, record).await
    }

    /// Progress callback for the body stream. Renders on every change of the
    /// integer percentage.
    fn progress_reporter(&self) -> impl FnMut(u64, u64) + Send + Sync + 'static {
        let sink = Arc::clone(&self.sink);
        let progress = Arc::clone(&self.progress);
        let mut last_percent: Option<u32> = None;

        move |sent, total| {
            let fraction = if total == 0 {
                1.0
            } else {
                (sent as f64 / total as f64).min(1.0)
            };
            progress.store(fraction.to_bits(), Ordering::Relaxed);

            let percent = (fraction * 100.0).round() as u32;
            if last_percent == Some(percent) {
                return;
            }
            last_percent = Some(percent);
            sink.render_progress(fraction);
            sink.render_status(&format!("{} {}%", STATUS_UPLOADING, percent));
        }
    }

    fn fail_transfer(&self, error: &ClientError) {
        {
            let mut state = self.lock();
            if let Some(attempt) = state.attempt.as_mut() {
                attempt.outcome = AttemptOutcome::Failed;
                attempt.progress_fraction = f64::from_bits(self.progress.load(Ordering::Relaxed));
            }
            state.selection = None;
            state.phase = UploadPhase::Failed;
        }
        error.log("upload_transfer");

        self.reset_form();
        self.sink.render_status(match error {
            ClientError::ServerRejection { .. } => STATUS_UPLOAD_REJECTED,
            _ => STATUS_UPLOAD_ERROR,
        });
    }

    async fn finalize(
        &self,
        session: UploadSession,
        record: FinalizationRecord,
    ) -> ClientResult<UploadReceipt> {
        self.lock().phase = UploadPhase::Finalizing;

        match self.api.finalize_upload(&record).await {
            Ok(response) => {
                {
                    let mut state = self.lock();
                    state.phase = UploadPhase::Finalized;
                    state.session = None;
                    state.selection = None;
                }

                let location = response
                    .redirect_url
                    .filter(|url| !url.trim().is_empty())
                    .unwrap_or_else(|| waitfor_path(&session.upload_hash));

                tracing::info!(
                    upload_hash = %session.upload_hash,
                    location = %location,
                    "Upload finalized"
                );
                self.sink.render_status(STATUS_FINALIZED);

                tokio::time::sleep(self.api.config().redirect_delay).await;
                self.sink.navigate(&location);

                Ok(UploadReceipt {
                    upload_hash: session.upload_hash,
                    location,
                })
            }
            Err(e) => {
                {
                    let mut state = self.lock();
                    state.phase = UploadPhase::Failed;
                    state.session = None;
                    state.selection = None;
                }
                // Finalization is not retried; the bytes stay on the server under this hash.
                tracing::error!(
                    upload_hash = %session.upload_hash,
                    error = %e,
                    "Upload finalization failed"
                );
                self.reset_form();
                self.sink.render_status(STATUS_FINALIZE_FAILED);
                Err(e)
            }
        }
    }

    /// Return the form to its pre-submission look.
    fn reset_form(&self) {
        self.sink.render_selection(None);
        self.sink.hide_progress();
        self.sink.render_status("");
        self.sink.set_controls_enabled(true);
    }

    /// Roll back a busy phase whose future went away before settling.
    fn abandon(&self) {
        let abandoned = {
            let mut state = self.lock();
            let phase = state.phase;
            if !phase.is_busy() {
                return;
            }
            // Once the bytes are up, whether finalization landed is unknown.
            if matches!(phase, UploadPhase::TransferDone | UploadPhase::Finalizing) {
                state.session = None;
            }
            if let Some(attempt) = state.attempt.as_mut() {
                if attempt.outcome == AttemptOutcome::Pending {
                    attempt.outcome = AttemptOutcome::Failed;
                }
            }
            if phase != UploadPhase::SessionRequested {
                state.selection = None;
            }
            state.phase = UploadPhase::Failed;
            phase
        };

        tracing::warn!(phase = %abandoned, "Upload abandoned before completion");
        if abandoned != UploadPhase::SessionRequested {
            self.reset_form();
            self.sink.render_status(STATUS_UPLOAD_ERROR);
        }
    }
}

/// Held while a busy phase is owned by a pending future. Every normal exit
/// leaves a settled phase first, so dropping it is then a no-op.
struct BusyGuard<'a>(&'a UploadOrchestrator);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.abandon();
    }
}
