use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use validator::Validate;

use crate::error::{ClientError, ClientResult};

/// Server-issued write target authorizing one file transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSession {
    pub upload_url: String,
    pub upload_hash: String,
}

/// Body of `GET /upload`. Every field is optional: the server omits
/// `upload_url` (or answers with an HTML page) when it cannot allocate one.
#[derive(Debug, Default, Deserialize)]
pub struct SessionResponse {
    #[serde(default)]
    pub upload_url: Option<String>,
    #[serde(default)]
    pub upload_hash: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SessionResponse {
    /// Convert into a session, rejecting responses with missing or blank fields.
    pub fn into_session(self) -> ClientResult<UploadSession> {
        let upload_url = self.upload_url.filter(|u| !u.trim().is_empty());
        let upload_hash = self.upload_hash.filter(|h| !h.trim().is_empty());

        match (upload_url, upload_hash) {
            (Some(upload_url), Some(upload_hash)) => Ok(UploadSession {
                upload_url,
                upload_hash,
            }),
            _ => Err(ClientError::InvalidResponse(
                self.error
                    .unwrap_or_else(|| "Response did not contain an upload session".to_string()),
            )),
        }
    }
}

/// Lifecycle of the upload orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadPhase {
    #[default]
    Idle,
    SessionRequested,
    SessionReady,
    Transferring,
    TransferDone,
    Finalizing,
    Finalized,
    Failed,
}

impl UploadPhase {
    /// True while a network exchange owned by the orchestrator is pending.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            UploadPhase::SessionRequested
                | UploadPhase::Transferring
                | UploadPhase::TransferDone
                | UploadPhase::Finalizing
        )
    }
}

impl Display for UploadPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadPhase::Idle => write!(f, "idle"),
            UploadPhase::SessionRequested => write!(f, "session_requested"),
            UploadPhase::SessionReady => write!(f, "session_ready"),
            UploadPhase::Transferring => write!(f, "transferring"),
            UploadPhase::TransferDone => write!(f, "transfer_done"),
            UploadPhase::Finalizing => write!(f, "finalizing"),
            UploadPhase::Finalized => write!(f, "finalized"),
            UploadPhase::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Pending,
    Succeeded,
    Failed,
}

/// One user-initiated submit. A retry creates a new attempt with the next
/// sequence number instead of resuming this one.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadAttempt {
    pub sequence: u32,
    pub file_name: String,
    pub content_type: String,
    pub total_bytes: u64,
    pub progress_fraction: f64,
    pub outcome: AttemptOutcome,
}

impl UploadAttempt {
    pub fn new(sequence: u32, file_name: &str, content_type: &str, total_bytes: u64) -> Self {
        Self {
            sequence,
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            total_bytes,
            progress_fraction: 0.0,
            outcome: AttemptOutcome::Pending,
        }
    }
}

/// Metadata sent once after a successful transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
pub struct FinalizationRecord {
    pub upload_url: String,
    pub upload_hash: String,
    #[validate(length(max = 128, message = "Title must be at most 128 characters"))]
    pub title: String,
    #[validate(length(max = 512, message = "Description must be at most 512 characters"))]
    pub description: String,
}

impl FinalizationRecord {
    pub fn new(session: &UploadSession, title: &str, description: &str) -> Self {
        Self {
            upload_url: session.upload_url.clone(),
            upload_hash: session.upload_hash.clone(),
            title: title.trim().to_string(),
            description: description.trim().to_string(),
        }
    }
}

/// Acknowledgment of `POST /upload`. The server may answer with an HTML
/// redirect page instead of JSON, in which case there is no redirect target.
#[derive(Debug, Default, Deserialize)]
pub struct FinalizeResponse {
    #[serde(default)]
    pub redirect_url: Option<String>,
}

impl FinalizeResponse {
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }
}

/// Conventional location of the processing page for a finished upload.
pub fn waitfor_path(upload_hash: &str) -> String {
    format!("/watch/waitfor/{}", upload_hash)
}
