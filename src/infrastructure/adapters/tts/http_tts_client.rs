//! HTTP TTS Client - 调用外部 TTS HTTP 服务
//!
//! 实现 TtsEnginePort trait，通过 HTTP 调用外部 TTS 服务
//!
//! 外部 TTS API:
//! POST {base_url}/api/tts/infer
//! Request: {"text": "...", "voice": "Charon"}  (JSON)
//! Response: audio binary, metadata in headers

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{InferRequest, InferResponse, TtsEnginePort, TtsError};

/// 重试间隔基数
const RETRY_BACKOFF_MS: u64 = 500;

/// TTS 推理请求体 (JSON)
#[derive(Debug, Serialize)]
struct TtsHttpRequest<'a> {
    text: &'a str,
    voice: &'a str,
}

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 重试次数
    pub max_retries: u32,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 120,
            max_retries: 0,
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// HTTP TTS 客户端
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
}

impl HttpTtsClient {
    /// 创建新的 HTTP TTS 客户端
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 获取推理 URL
    fn infer_url(&self) -> String {
        format!("{}/api/tts/infer", self.config.base_url.trim_end_matches('/'))
    }

    /// 获取健康检查 URL
    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url.trim_end_matches('/'))
    }

    async fn infer_once(&self, request: &InferRequest) -> Result<InferResponse, TtsError> {
        let body = TtsHttpRequest {
            text: &request.text,
            voice: request.voice.as_str(),
        };

        let response = self
            .client
            .post(self.infer_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout
                } else if e.is_connect() {
                    TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
                } else {
                    TtsError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::ServiceError(format!("HTTP {}: {}", status, error_text)));
        }

        // 从 headers 提取元数据
        let headers = response.headers();
        let duration_ms = headers
            .get("X-TTS-Duration-Ms")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let sample_rate = headers
            .get("X-TTS-Sample-Rate")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();

        if audio_data.is_empty() {
            return Err(TtsError::InvalidResponse("empty audio body".to_string()));
        }

        Ok(InferResponse {
            audio_data,
            duration_ms,
            sample_rate,
            cached: false,
        })
    }
}

/// 网络错误、超时和 5xx 可以重试
fn is_retryable(error: &TtsError) -> bool {
    match error {
        TtsError::NetworkError(_) | TtsError::Timeout => true,
        TtsError::ServiceError(message) => message.starts_with("HTTP 5"),
        TtsError::InvalidResponse(_) => false,
    }
}

#[async_trait]
impl TtsEnginePort for HttpTtsClient {
    async fn infer(&self, request: InferRequest) -> Result<InferResponse, TtsError> {
        tracing::debug!(
            url = %self.infer_url(),
            text_len = request.text.len(),
            voice = %request.voice,
            "Sending TTS infer request"
        );

        let mut attempt = 0;
        loop {
            match self.infer_once(&request).await {
                Ok(response) => {
                    tracing::info!(
                        voice = %request.voice,
                        duration_ms = ?response.duration_ms,
                        sample_rate = ?response.sample_rate,
                        audio_size = response.audio_data.len(),
                        "TTS inference completed"
                    );
                    return Ok(response);
                }
                Err(e) if attempt < self.config.max_retries && is_retryable(&e) => {
                    attempt += 1;
                    tracing::warn!(attempt = attempt, error = %e, "TTS request failed, retrying");
                    tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS * u64::from(attempt))).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HttpTtsClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_config_builder() {
        let config = HttpTtsClientConfig::new("http://example.com:9000/")
            .with_timeout(60)
            .with_retries(2);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.max_retries, 2);

        let client = HttpTtsClient::new(config).unwrap();
        assert_eq!(client.infer_url(), "http://example.com:9000/api/tts/infer");
    }

    #[test]
    fn test_retryable_errors() {
        assert!(is_retryable(&TtsError::Timeout));
        assert!(is_retryable(&TtsError::ServiceError("HTTP 503 Service Unavailable: busy".into())));
        assert!(!is_retryable(&TtsError::ServiceError("HTTP 400 Bad Request: no".into())));
        assert!(!is_retryable(&TtsError::InvalidResponse("empty".into())));
    }

    #[tokio::test]
    async fn test_unreachable_service_reports_network_error() {
        let client = HttpTtsClient::new(HttpTtsClientConfig::new("http://127.0.0.1:1").with_timeout(2)).unwrap();
        let result = client
            .infer(InferRequest {
                text: "Hello".to_string(),
                voice: crate::domain::playback::VoiceName::Charon,
            })
            .await;
        assert!(matches!(result, Err(TtsError::NetworkError(_)) | Err(TtsError::Timeout)));
        assert!(!client.health_check().await);
    }
}
