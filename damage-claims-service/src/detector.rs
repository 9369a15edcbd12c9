use std::time::Duration;

use async_trait::async_trait;
use claim_core::{ClaimError, DamageDetector, Detection, Result};
use tracing::debug;

/// Client for the external object-detection model, reached over HTTP.
/// Raw image bytes go out, a list of classified detections comes back.
pub struct HttpDetector {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpDetector {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build detector HTTP client");
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl DamageDetector for HttpDetector {
    async fn detect(&self, image: &[u8]) -> Result<Vec<Detection>> {
        debug!(bytes = image.len(), endpoint = %self.endpoint, "sending image to detector");

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| ClaimError::DetectionFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| ClaimError::DetectionFailed(e.to_string()))?;

        response
            .json::<Vec<Detection>>()
            .await
            .map_err(|e| ClaimError::DetectionFailed(format!("invalid detector response: {e}")))
    }
}
