//! HTTP client and action orchestrators for vidhost.
//!
//! [`ApiClient`] is the transport: generic JSON/empty-body helpers that map
//! every outcome onto [`ClientError`]. The endpoint methods live in [`api`].
//! On top of it sit the three orchestrators driven by the pages:
//! [`UploadOrchestrator`], [`EngagementClient`] and [`WatchTracker`].

pub mod api;
pub mod engagement;
pub mod upload;
pub mod watch;

use anyhow::Context;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use vidhost_core::models::ErrorBody;
use vidhost_core::{ClientConfig, ClientError, ClientResult};

/// HTTP client for the vidhost server.
///
/// Keeps a cookie store so the server-side session (login, upload session,
/// watch tokens) follows every request.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config
            .validate()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Create client from environment (VIDHOST_BASE_URL or API_URL, see [`ClientConfig`]).
    pub fn from_env() -> anyhow::Result<Self> {
        let config = ClientConfig::from_env().context("Invalid client configuration")?;
        Self::new(config).context("Failed to create API client")
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn build_url(&self, path: &str) -> String {
        self.config.resolve(path)
    }

    /// Request against a server path with the configured request timeout.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.build_url(path))
            .timeout(self.config.request_timeout)
    }

    /// GET request. Deserializes a JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = send(self.request(Method::GET, path)).await?;
        let text = response.text().await.map_err(transport_error)?;
        serde_json::from_str(&text).map_err(|e| {
            ClientError::InvalidResponse(format!("Expected JSON from GET {}: {}", path, e))
        })
    }

    /// POST a JSON body. Returns the raw response text; not every endpoint
    /// answers with JSON.
    pub async fn post_json<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<String> {
        let response = send(self.request(Method::POST, path).json(body)).await?;
        response.text().await.map_err(transport_error)
    }

    /// POST without a body. Returns Ok(()) on success.
    pub async fn post_empty(&self, path: &str) -> ClientResult<()> {
        send(self.request(Method::POST, path)).await?;
        Ok(())
    }

    /// DELETE request. Returns Ok(()) on success.
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    /// Raw client for custom requests. The byte transfer uses it directly so
    /// the request timeout does not cut off large bodies; it has its own idle
    /// timeout instead.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Send a request and turn non-2xx responses into [`ClientError::ServerRejection`].
pub(crate) async fn send(request: RequestBuilder) -> ClientResult<Response> {
    let response = request.send().await.map_err(transport_error)?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(ClientError::server_rejection(
            status.as_u16(),
            ErrorBody::message_from(&error_text),
        ));
    }

    Ok(response)
}

/// Classify a reqwest failure. Status errors never reach this point because
/// [`send`] checks the status itself.
pub(crate) fn transport_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Transport(format!("Request timed out: {}", err))
    } else if err.is_connect() {
        ClientError::Transport(format!("Connection failed: {}", err))
    } else {
        ClientError::Transport(err.to_string())
    }
}

pub use api::paths;
pub use engagement::{DeleteOutcome, EngagementClient};
pub use upload::{UploadOrchestrator, UploadReceipt};
pub use watch::{TrackerExit, ViewRecorder, WatchThreshold, WatchTracker};
