//! HTTP client for the local inference sidecar.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use vigil_models::Detection;

use crate::error::{VisionError, VisionResult};
use crate::providers::{AttributeEngine, Detector, FrameSource};
use crate::types::{
    AnalyzeRequest, AnalyzeResponse, DetectResponse, FrameImage, HealthResponse,
    SubjectAttributes,
};

/// Configuration for the sidecar client.
#[derive(Debug, Clone)]
pub struct SidecarConfig {
    /// Base URL of the inference sidecar
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8765".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl SidecarConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("VIGIL_SIDECAR_URL")
                .unwrap_or_else(|_| "http://localhost:8765".to_string()),
            timeout: Duration::from_secs(
                std::env::var("VIGIL_SIDECAR_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        }
    }
}

/// Client for the on-device detection/inference sidecar.
///
/// The sidecar hosts the camera, the object-detection model and the
/// generative model behind a small local HTTP surface; this client
/// implements all three provider traits against it.
pub struct SidecarClient {
    http: Client,
    config: SidecarConfig,
}

impl SidecarClient {
    /// Create a new sidecar client.
    pub fn new(config: SidecarConfig) -> VisionResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(VisionError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> VisionResult<Self> {
        Self::new(SidecarConfig::from_env())
    }

    /// Check if the sidecar is up.
    pub async fn health_check(&self) -> VisionResult<bool> {
        let url = format!("{}/health", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("Sidecar health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Sidecar health check error: {}", e);
                Ok(false)
            }
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> VisionResult<T> {
        let url = format!("{}{}", self.config.base_url, endpoint);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::request_failed(format!(
                "sidecar returned {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Detector for SidecarClient {
    async fn detect(&self) -> VisionResult<Vec<Detection>> {
        let response: DetectResponse = self.get_json("/detect").await?;
        Ok(response.detections)
    }

    fn name(&self) -> &'static str {
        "sidecar"
    }
}

#[async_trait]
impl FrameSource for SidecarClient {
    async fn capture(&self) -> VisionResult<FrameImage> {
        self.get_json("/frame").await
    }
}

#[async_trait]
impl AttributeEngine for SidecarClient {
    async fn analyze(&self, request: &AnalyzeRequest) -> VisionResult<Vec<SubjectAttributes>> {
        let url = format!("{}/analyze", self.config.base_url);

        debug!(
            identities = request.identities.len(),
            "Sending attribute analysis request to {}", url
        );

        let response = self.http.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::request_failed(format!(
                "sidecar returned {}: {}",
                status, body
            )));
        }

        let analyze: AnalyzeResponse = response.json().await?;
        crate::prompt::parse_subjects(&analyze.raw)
    }

    fn name(&self) -> &'static str {
        "sidecar"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use vigil_models::{AttributeSchema, BBox};

    use crate::types::IdentityRef;

    #[test]
    fn test_config_defaults() {
        let config = SidecarConfig::default();
        assert_eq!(config.base_url, "http://localhost:8765");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    fn client_for(server: &MockServer) -> SidecarClient {
        SidecarClient::new(SidecarConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn request() -> AnalyzeRequest {
        AnalyzeRequest {
            identities: vec![IdentityRef {
                id: "trk-1".to_string(),
                bbox: BBox::new(0.4, 0.3, 0.1, 0.3),
            }],
            image: "aGVsbG8=".to_string(),
            prompt: "describe".to_string(),
            schema: AttributeSchema::default(),
        }
    }

    #[tokio::test]
    async fn test_analyze_parses_fenced_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "raw": "```json\n[{\"id\": \"trk-1\", \"mood\": \"happy\"}]\n```"
            })))
            .mount(&server)
            .await;

        let subjects = client_for(&server).analyze(&request()).await.unwrap();
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].id, "trk-1");
        assert_eq!(subjects[0].attributes["mood"], "happy");
    }

    #[tokio::test]
    async fn test_analyze_maps_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
            .mount(&server)
            .await;

        let err = client_for(&server).analyze(&request()).await.unwrap_err();
        assert!(matches!(err, VisionError::RequestFailed(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_analyze_rejects_unparseable_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "raw": "sorry, I cannot see anyone"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).analyze(&request()).await.unwrap_err();
        assert!(matches!(err, VisionError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_detect_returns_detections() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/detect"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "detections": [
                    {"bbox": {"x": 0.1, "y": 0.2, "width": 0.1, "height": 0.3}, "score": 0.9}
                ]
            })))
            .mount(&server)
            .await;

        let detections = client_for(&server).detect().await.unwrap();
        assert_eq!(detections.len(), 1);
        assert!((detections[0].score - 0.9).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_health_check_down_is_ok_false() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(!client_for(&server).health_check().await.unwrap());
    }
}
