//! HTTP clients for the shot-detection and text-video matching services.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{MlError, MlResult};
use crate::types::{MatchRequest, MatchResponse, ShotDetectionRequest, ShotDetectionResponse};

/// Detects shot boundaries in a source video.
#[async_trait]
pub trait ShotDetector: Send + Sync {
    async fn detect(&self, resource_id: &str) -> MlResult<ShotDetectionResponse>;
}

/// Matches narration lines against candidate clips.
#[async_trait]
pub trait MatchingService: Send + Sync {
    async fn match_script(&self, request: &MatchRequest) -> MlResult<MatchResponse>;
}

/// Configuration for ML client.
#[derive(Debug, Clone)]
pub struct MlClientConfig {
    /// Base URL of the shot-detection service
    pub shot_detection_url: String,
    /// Base URL of the text-video matching service
    pub matching_url: String,
    pub timeout: Duration,
}

impl Default for MlClientConfig {
    fn default() -> Self {
        Self {
            shot_detection_url: "http://localhost:8001".to_string(),
            matching_url: "http://localhost:8002".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl MlClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            shot_detection_url: std::env::var("SHOT_DETECTION_URL")
                .unwrap_or(defaults.shot_detection_url),
            matching_url: std::env::var("TEXT_MATCH_URL").unwrap_or(defaults.matching_url),
            timeout: std::env::var("ML_SERVICE_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}

/// Client for the ML services used by montage assembly.
#[derive(Debug, Clone)]
pub struct MlClient {
    http: Client,
    config: MlClientConfig,
}

impl MlClient {
    pub fn new(config: MlClientConfig) -> MlResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MlError::Network)?;

        Ok(Self { http, config })
    }

    pub fn from_env() -> MlResult<Self> {
        Self::new(MlClientConfig::from_env())
    }

    async fn post_json<Req, Resp>(&self, url: &str, body: &Req) -> MlResult<Resp>
    where
        Req: Serialize + Sync + ?Sized,
        Resp: DeserializeOwned,
    {
        debug!("POST {}", url);

        let response = self.http.post(url).json(body).send().await?;

        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(MlError::ServiceUnavailable(url.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MlError::RequestFailed(format!(
                "{} returned {}: {}",
                url, status, body
            )));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| MlError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ShotDetector for MlClient {
    async fn detect(&self, resource_id: &str) -> MlResult<ShotDetectionResponse> {
        let url = format!("{}/detect", self.config.shot_detection_url.trim_end_matches('/'));
        let request = ShotDetectionRequest {
            resource_id: resource_id.to_string(),
        };
        self.post_json(&url, &request).await
    }
}

#[async_trait]
impl MatchingService for MlClient {
    async fn match_script(&self, request: &MatchRequest) -> MlResult<MatchResponse> {
        let url = format!("{}/match", self.config.matching_url.trim_end_matches('/'));
        debug!(
            request_id = %request.request_id,
            lines = request.script.len(),
            resources = request.clip_resources.len(),
            "Sending match request"
        );
        self.post_json(&url, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScriptLine;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> MlClient {
        MlClient::new(MlClientConfig {
            shot_detection_url: server.uri(),
            matching_url: server.uri(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn match_request() -> MatchRequest {
        MatchRequest {
            request_id: "req-1".to_string(),
            script: vec![ScriptLine {
                text: "hello".to_string(),
                start_time: 0.0,
                end_time: 2.0,
            }],
            clip_resources: vec![],
            need_asd: false,
            first_industry_name: None,
            second_industry_name: None,
            source_type: "default".to_string(),
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = MlClientConfig::default();
        assert_eq!(config.shot_detection_url, "http://localhost:8001");
        assert_eq!(config.timeout, Duration::from_secs(120));
    }

    #[tokio::test]
    async fn test_detect_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/detect"))
            .and(body_partial_json(json!({"resource_id": "videos/a.mp4"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "version": "det-2",
                "clips": [
                    {"start_time": 0, "end_time": 4000, "resource_id": "r1"},
                    {"start_time": 4000, "end_time": 9000}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server).detect("videos/a.mp4").await.unwrap();
        assert!(response.success);
        assert_eq!(response.version, "det-2");
        assert_eq!(response.clips.len(), 2);
        assert_eq!(response.clips[0].resource_id.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_match_failure_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/match"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client_for(&server).match_script(&match_request()).await.unwrap_err();
        assert!(matches!(err, MlError::RequestFailed(ref msg) if msg.contains("boom")));
    }

    #[tokio::test]
    async fn test_match_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/match"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).match_script(&match_request()).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_match_service_answer_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/match"))
            .and(body_partial_json(json!({"request_id": "req-1", "source_type": "default"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "isSuccess": false,
                "error_info": "no candidates",
                "result_code": "E_EMPTY"
            })))
            .mount(&server)
            .await;

        let response = client_for(&server).match_script(&match_request()).await.unwrap();
        assert!(!response.is_success);
        assert_eq!(response.result_code_label(), "E_EMPTY");
        assert_eq!(response.error_info.as_deref(), Some("no candidates"));
    }
}
