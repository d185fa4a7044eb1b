//! Endpoint methods for the vidhost API.
//!
//! One method per server endpoint. These only speak HTTP; state and UI
//! reconciliation belong to the orchestrators.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Method};
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::io::ReaderStream;

use crate::{send, ApiClient};
use vidhost_core::config::TransferMethod;
use vidhost_core::models::{
    CommentRequest, FilePayload, FinalizationRecord, FinalizeResponse, PayloadSource,
    SessionResponse, UploadSession,
};
use vidhost_core::{ClientError, ClientResult};

type PayloadStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + Sync>>;

/// Size of the chunks handed to the transfer body, and thus the progress granularity.
pub const TRANSFER_CHUNK_SIZE: usize = 64 * 1024;

/// Server paths.
pub mod paths {
    pub const UPLOAD: &str = "/upload";

    pub fn view(watch_id: &str) -> String {
        format!("/api/video/view/{}", urlencoding::encode(watch_id))
    }

    pub fn like(video_hash: &str) -> String {
        format!("/api/video/like/{}", urlencoding::encode(video_hash))
    }

    pub fn video(video_hash: &str) -> String {
        format!("/api/video/{}", urlencoding::encode(video_hash))
    }

    pub fn comment(video_hash: &str) -> String {
        format!("/api/video/comment/{}", urlencoding::encode(video_hash))
    }
}

impl ApiClient {
    /// Allocate a write target for one upload (`GET /upload`).
    pub async fn acquire_upload_session(&self) -> ClientResult<UploadSession> {
        let response: SessionResponse = self.get_json(paths::UPLOAD).await?;
        response.into_session()
    }

    /// Send the payload bytes to the session's upload URL in one streamed
    /// request. `on_progress(sent, total)` is called for every chunk handed to
    /// the connection.
    ///
    /// There is no overall deadline, since large files legitimately take long.
    /// Instead the transfer fails with [`ClientError::Transport`] once it has
    /// made no progress for `transfer_idle_timeout`.
    pub async fn transfer<F>(
        &self,
        session: &UploadSession,
        payload: &FilePayload,
        content_type: &str,
        mut on_progress: F,
    ) -> ClientResult<()>
    where
        F: FnMut(u64, u64) + Send + Sync + 'static,
    {
        let total = payload.size();
        let mut sent: u64 = 0;
        let activity = Arc::new(Notify::new());
        let chunk_activity = Arc::clone(&activity);
        let body_stream = payload_stream(payload).await?.map(move |chunk| {
            if let Ok(bytes) = &chunk {
                sent += bytes.len() as u64;
                chunk_activity.notify_one();
                on_progress(sent, total);
            }
            chunk
        });

        let method = match self.config().transfer_method {
            TransferMethod::Put => Method::PUT,
            TransferMethod::Post => Method::POST,
        };
        let url = self.build_url(&session.upload_url);

        tracing::debug!(
            upload_hash = %session.upload_hash,
            method = %method,
            total_bytes = total,
            content_type = %content_type,
            "Starting byte transfer"
        );

        let request = self
            .client()
            .request(method, url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, total)
            .body(Body::wrap_stream(body_stream));

        let idle_timeout = self.config().transfer_idle_timeout;
        tokio::select! {
            result = send(request) => {
                result?;
                Ok(())
            }
            _ = stalled(&activity, idle_timeout) => {
                tracing::warn!(
                    upload_hash = %session.upload_hash,
                    idle_secs = idle_timeout.as_secs_f64(),
                    "Byte transfer stalled"
                );
                Err(ClientError::Transport(format!(
                    "Upload stalled: no progress for {:?}",
                    idle_timeout
                )))
            }
        }
    }

    /// Publish the uploaded file with its metadata (`POST /upload`).
    pub async fn finalize_upload(
        &self,
        record: &FinalizationRecord,
    ) -> ClientResult<FinalizeResponse> {
        let body = self.post_json(paths::UPLOAD, record).await?;
        Ok(FinalizeResponse::from_body(&body))
    }

    /// Count a view for the page view identified by `watch_id`.
    pub async fn record_view(&self, watch_id: &str) -> ClientResult<()> {
        self.post_empty(&paths::view(watch_id)).await
    }

    pub async fn like_video(&self, video_hash: &str) -> ClientResult<()> {
        self.post_empty(&paths::like(video_hash)).await
    }

    pub async fn unlike_video(&self, video_hash: &str) -> ClientResult<()> {
        self.delete(&paths::like(video_hash)).await
    }

    pub async fn delete_video(&self, video_hash: &str) -> ClientResult<()> {
        self.delete(&paths::video(video_hash)).await
    }

    pub async fn post_comment(
        &self,
        video_hash: &str,
        comment: &CommentRequest,
    ) -> ClientResult<()> {
        self.post_json(&paths::comment(video_hash), comment).await?;
        Ok(())
    }
}

/// Resolves once `activity` has not been signalled for `idle`. A signal sent
/// while nobody waits is kept as a permit, so no chunk goes unnoticed.
async fn stalled(activity: &Notify, idle: Duration) {
    while tokio::time::timeout(idle, activity.notified()).await.is_ok() {}
}

/// Stream the payload in [`TRANSFER_CHUNK_SIZE`] chunks. Files are read lazily.
async fn payload_stream(payload: &FilePayload) -> ClientResult<PayloadStream> {
    match payload.source() {
        PayloadSource::Memory(data) => {
            let data = data.clone();
            let chunks: Vec<io::Result<Bytes>> = (0..data.len())
                .step_by(TRANSFER_CHUNK_SIZE)
                .map(|start| {
                    let end = (start + TRANSFER_CHUNK_SIZE).min(data.len());
                    Ok(data.slice(start..end))
                })
                .collect();
            Ok(Box::pin(stream::iter(chunks)))
        }
        PayloadSource::Path(path) => {
            let file = tokio::fs::File::open(path).await.map_err(ClientError::Io)?;
            Ok(Box::pin(ReaderStream::with_capacity(file, TRANSFER_CHUNK_SIZE)))
        }
    }
}
