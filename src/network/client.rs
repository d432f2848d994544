//! Liveness requests against the feed reader's web server

use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::network::endpoint;

/// Failure to obtain a liveness answer
#[derive(Debug, Error)]
pub enum BeaconError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed beacon response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid server address: {0}")]
    InvalidEndpoint(String),
}

/// Envelope returned by `/ajax/beacon`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BeaconResponse {
    #[serde(rename = "Status", default)]
    pub status: bool,
    #[serde(rename = "Message", default)]
    pub message: String,
    #[serde(rename = "Hostname", default)]
    pub hostname: String,
    #[serde(rename = "Timestamp", default)]
    pub timestamp: String,
}

impl BeaconResponse {
    /// Status text shown for a healthy server
    pub fn alive_text(&self) -> String {
        format!(
            "{} running on {} is alive at {}",
            self.message, self.hostname, self.timestamp
        )
    }
}

/// Something that can ask a server whether it is alive.
pub trait LivenessProbe: Send + Sync {
    fn check(&self) -> impl Future<Output = Result<BeaconResponse, BeaconError>> + Send;
}

impl<T: LivenessProbe> LivenessProbe for Arc<T> {
    fn check(&self) -> impl Future<Output = Result<BeaconResponse, BeaconError>> + Send {
        self.as_ref().check()
    }
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address as typed by the user (see [`endpoint::parse_base_url`])
    pub server: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: format!("http://localhost:{}", endpoint::DEFAULT_PORT),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Probe that issues `GET <base>/ajax/beacon`
#[derive(Debug, Clone)]
pub struct HttpBeaconClient {
    client: reqwest::Client,
    url: String,
}

impl HttpBeaconClient {
    pub fn new(config: &ClientConfig) -> Result<Self, BeaconError> {
        let base = endpoint::parse_base_url(&config.server).map_err(BeaconError::InvalidEndpoint)?;
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let url = endpoint::beacon_url(&base);
        tracing::info!("Beacon endpoint: {}", url);
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl LivenessProbe for HttpBeaconClient {
    fn check(&self) -> impl Future<Output = Result<BeaconResponse, BeaconError>> + Send {
        async move {
            let response = self.client.get(&self.url).send().await?.error_for_status()?;
            let body = response.bytes().await?;
            let decoded: BeaconResponse = serde_json::from_slice(&body)?;
            Ok(decoded)
        }
    }
}
