//! HTTP client for the evaluation backend
//!
//! Every call is bounded by its own timeout. Transport failures, non-200
//! answers and undecodable bodies are logged and reported as `None`, so the
//! chat never fails because the backend is down.

use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use super::types::{BackendStatus, EvaluationResult, HealthStatus, RequestMetadata, TextEvaluationRequest};

/// Operations the chat needs from an evaluation backend
#[async_trait]
pub trait EvaluationBackend: Send + Sync {
    /// Evaluate a piece of text. `None` means it could not be evaluated.
    async fn evaluate_text(&self, text: &str, metadata: &RequestMetadata) -> Option<EvaluationResult>;

    /// Evaluate an image of writing. `None` means it could not be evaluated.
    async fn evaluate_image(
        &self,
        bytes: &[u8],
        file_name: &str,
        mime_type: &str,
        metadata: &RequestMetadata,
    ) -> Option<EvaluationResult>;

    /// Probe the health endpoint and classify the answer
    async fn probe(&self) -> BackendStatus;

    /// Health details when the backend is online
    async fn check_health(&self) -> Option<HealthStatus> {
        match self.probe().await {
            BackendStatus::Online { health } => Some(health),
            _ => None,
        }
    }
}

/// Per-endpoint request timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendTimeouts {
    pub evaluate: Duration,
    pub image: Duration,
    pub health: Duration,
}

impl Default for BackendTimeouts {
    fn default() -> Self {
        Self {
            evaluate: Duration::from_secs(60),
            image: Duration::from_secs(120),
            health: Duration::from_secs(5),
        }
    }
}

/// `EvaluationBackend` over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    timeouts: BackendTimeouts,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeouts: BackendTimeouts) -> anyhow::Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeouts,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl EvaluationBackend for HttpBackend {
    async fn evaluate_text(&self, text: &str, metadata: &RequestMetadata) -> Option<EvaluationResult> {
        let payload = TextEvaluationRequest {
            text,
            user_id: &metadata.user_id,
            title: &metadata.title,
        };

        let request = self
            .client
            .post(self.url("/evaluate"))
            .timeout(self.timeouts.evaluate)
            .json(&payload);

        debug!("Sending {} chars for text evaluation", text.len());
        read_evaluation("/evaluate", request.send().await).await
    }

    async fn evaluate_image(
        &self,
        bytes: &[u8],
        file_name: &str,
        mime_type: &str,
        metadata: &RequestMetadata,
    ) -> Option<EvaluationResult> {
        let image = match multipart::Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str(mime_type)
        {
            Ok(part) => part,
            Err(e) => {
                warn!("Invalid mime type {:?} for {}: {}", mime_type, file_name, e);
                return None;
            }
        };

        let form = multipart::Form::new()
            .part("image", image)
            .text("user_id", metadata.user_id.clone())
            .text("title", metadata.title.clone());

        let request = self
            .client
            .post(self.url("/evaluate-image"))
            .timeout(self.timeouts.image)
            .multipart(form);

        debug!("Uploading image {} ({} bytes) for evaluation", file_name, bytes.len());
        read_evaluation("/evaluate-image", request.send().await).await
    }

    async fn probe(&self) -> BackendStatus {
        let response = self
            .client
            .get(self.url("/health"))
            .timeout(self.timeouts.health)
            .send()
            .await;

        match response {
            Ok(response) if response.status() == StatusCode::OK => {
                match response.json::<HealthStatus>().await {
                    Ok(health) => BackendStatus::Online { health },
                    Err(e) => {
                        warn!("Health endpoint returned an unreadable body: {}", e);
                        BackendStatus::Error { http_status: StatusCode::OK.as_u16() }
                    }
                }
            }
            Ok(response) => {
                warn!("Health check answered with {}", response.status());
                BackendStatus::Error {
                    http_status: response.status().as_u16(),
                }
            }
            Err(e) => {
                warn!("Backend unreachable at {}: {}", self.base_url, e);
                BackendStatus::Offline
            }
        }
    }
}

async fn read_evaluation(
    endpoint: &str,
    response: reqwest::Result<reqwest::Response>,
) -> Option<EvaluationResult> {
    let response = match response {
        Ok(response) => response,
        Err(e) if e.is_timeout() => {
            warn!("Request to {} timed out", endpoint);
            return None;
        }
        Err(e) => {
            warn!("Request to {} failed: {}", endpoint, e);
            return None;
        }
    };

    if response.status() != StatusCode::OK {
        warn!("{} answered with {}", endpoint, response.status());
        return None;
    }

    match response.json::<EvaluationResult>().await {
        Ok(result) => {
            debug!("{} returned an evaluation", endpoint);
            Some(result)
        }
        Err(e) => {
            warn!("Failed to decode response from {}: {}", endpoint, e);
            None
        }
    }
}
