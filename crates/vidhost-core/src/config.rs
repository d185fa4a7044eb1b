//! Configuration module
//!
//! Client configuration: server origin, timeouts, upload transfer settings and
//! the watch-threshold tracker parameters. Values come from the environment
//! (optionally a `.env` file) with typed defaults.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;

// Common constants
const BASE_URL: &str = "http://localhost:5000";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const CONNECT_TIMEOUT_SECS: u64 = 10;
const TRANSFER_IDLE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONTENT_TYPE: &str = "video/mp4";
const REDIRECT_DELAY_MS: u64 = 1000;
const WATCH_THRESHOLD: f64 = 0.15;
const WATCH_POLL_INTERVAL_MS: u64 = 1000;
const HOME_PATH: &str = "/";

/// HTTP method used to send file bytes to the session's upload URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMethod {
    #[default]
    Put,
    Post,
}

impl Display for TransferMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TransferMethod::Put => write!(f, "PUT"),
            TransferMethod::Post => write!(f, "POST"),
        }
    }
}

impl FromStr for TransferMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PUT" => Ok(TransferMethod::Put),
            "POST" => Ok(TransferMethod::Post),
            other => Err(anyhow::anyhow!(
                "Invalid transfer method: {}. Must be one of: PUT, POST",
                other
            )),
        }
    }
}

/// Client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub transfer_method: TransferMethod,
    /// Longest the byte transfer may go without progress (no chunk accepted,
    /// or no response after the last one) before it fails as a transport error.
    pub transfer_idle_timeout: Duration,
    pub default_content_type: String,
    /// Delay between a successful finalization and the navigation it triggers.
    pub redirect_delay: Duration,
    /// Fraction of the playable duration after which a view is recorded.
    pub watch_threshold: f64,
    pub watch_poll_interval: Duration,
    /// Where to navigate after a resource has been deleted.
    pub home_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            transfer_method: TransferMethod::Put,
            transfer_idle_timeout: Duration::from_secs(TRANSFER_IDLE_TIMEOUT_SECS),
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
            redirect_delay: Duration::from_millis(REDIRECT_DELAY_MS),
            watch_threshold: WATCH_THRESHOLD,
            watch_poll_interval: Duration::from_millis(WATCH_POLL_INTERVAL_MS),
            home_path: HOME_PATH.to_string(),
        }
    }
}

impl ClientConfig {
    /// Default configuration pointed at `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup. `from_env` uses the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("VIDHOST_BASE_URL")
            .or_else(|| lookup("API_URL"))
            .unwrap_or_else(|| BASE_URL.to_string());

        let transfer_method = match lookup("VIDHOST_TRANSFER_METHOD") {
            Some(value) => value.parse()?,
            None => TransferMethod::Put,
        };

        let watch_threshold = match lookup("VIDHOST_WATCH_THRESHOLD") {
            Some(value) => value.trim().parse::<f64>().map_err(|_| {
                anyhow::anyhow!("VIDHOST_WATCH_THRESHOLD must be a number between 0 and 1")
            })?,
            None => WATCH_THRESHOLD,
        };

        let config = Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(
                lookup("VIDHOST_REQUEST_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(REQUEST_TIMEOUT_SECS),
            ),
            connect_timeout: Duration::from_secs(
                lookup("VIDHOST_CONNECT_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(CONNECT_TIMEOUT_SECS),
            ),
            transfer_method,
            transfer_idle_timeout: Duration::from_secs(
                lookup("VIDHOST_TRANSFER_IDLE_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(TRANSFER_IDLE_TIMEOUT_SECS),
            ),
            default_content_type: lookup("VIDHOST_DEFAULT_CONTENT_TYPE")
                .map(|s| s.trim().to_lowercase())
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            redirect_delay: Duration::from_millis(
                lookup("VIDHOST_REDIRECT_DELAY_MS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(REDIRECT_DELAY_MS),
            ),
            watch_threshold,
            watch_poll_interval: Duration::from_millis(
                lookup("VIDHOST_WATCH_POLL_INTERVAL_MS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(WATCH_POLL_INTERVAL_MS),
            ),
            home_path: lookup("VIDHOST_HOME_PATH").unwrap_or_else(|| HOME_PATH.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "Base URL must start with http:// or https://, got '{}'",
                self.base_url
            ));
        }

        if !(self.watch_threshold > 0.0 && self.watch_threshold < 1.0) {
            return Err(anyhow::anyhow!(
                "Watch threshold must be strictly between 0 and 1, got {}",
                self.watch_threshold
            ));
        }

        if self.watch_poll_interval.is_zero() {
            return Err(anyhow::anyhow!("Watch poll interval must be greater than zero"));
        }

        if self.transfer_idle_timeout.is_zero() {
            return Err(anyhow::anyhow!("Transfer idle timeout must be greater than zero"));
        }

        if self.default_content_type.is_empty() || !self.default_content_type.contains('/') {
            return Err(anyhow::anyhow!(
                "Default content type must be a MIME type, got '{}'",
                self.default_content_type
            ));
        }

        if !self.home_path.starts_with('/') {
            return Err(anyhow::anyhow!("Home path must start with '/'"));
        }

        Ok(())
    }

    /// Join a server path (e.g. "/upload") to the base URL. Absolute URLs are
    /// returned unchanged.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}
