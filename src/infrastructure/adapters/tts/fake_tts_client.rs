//! Fake TTS Client - 用于测试的 TTS 客户端
//!
//! 不调用外部服务，按文本长度生成静音 WAV

use async_trait::async_trait;
use std::time::Duration;

use crate::application::ports::{InferRequest, InferResponse, TtsEnginePort, TtsError};
use crate::infrastructure::adapters::audio::silent_wav;

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 每个字符对应的时长（毫秒）
    pub ms_per_char: u64,
    /// 采样率
    pub sample_rate: u32,
    /// 模拟推理延迟（毫秒）
    pub latency_ms: u64,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            ms_per_char: 60,
            sample_rate: 16000,
            latency_ms: 200,
        }
    }
}

const MIN_DURATION_MS: u64 = 500;
const MAX_DURATION_MS: u64 = 60_000;

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig) -> Self {
        tracing::info!(
            ms_per_char = config.ms_per_char,
            sample_rate = config.sample_rate,
            "FakeTtsClient initialized"
        );
        Self { config }
    }

    /// 使用默认配置创建
    pub fn with_defaults() -> Self {
        Self::new(FakeTtsClientConfig::default())
    }

    fn duration_for(&self, text: &str) -> u64 {
        (text.chars().count() as u64 * self.config.ms_per_char).clamp(MIN_DURATION_MS, MAX_DURATION_MS)
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn infer(&self, request: InferRequest) -> Result<InferResponse, TtsError> {
        let duration_ms = self.duration_for(&request.text);

        tracing::debug!(
            text_len = request.text.len(),
            voice = %request.voice,
            duration_ms = duration_ms,
            "FakeTtsClient: returning silent audio"
        );

        // 模拟推理延迟
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        Ok(InferResponse {
            audio_data: silent_wav(duration_ms, self.config.sample_rate),
            duration_ms: Some(duration_ms),
            sample_rate: Some(self.config.sample_rate),
            cached: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::playback::VoiceName;
    use crate::infrastructure::adapters::audio::probe;

    #[tokio::test]
    async fn test_audio_length_follows_text() {
        let client = FakeTtsClient::new(FakeTtsClientConfig {
            latency_ms: 0,
            ..Default::default()
        });

        let response = client
            .infer(InferRequest {
                text: "x".repeat(50),
                voice: VoiceName::Puck,
            })
            .await
            .unwrap();

        assert_eq!(response.duration_ms, Some(3000));
        let info = probe(&response.audio_data).unwrap();
        assert!((info.duration_secs - 3.0).abs() < 0.01);
    }

    #[test]
    fn test_duration_is_bounded() {
        let client = FakeTtsClient::with_defaults();
        assert_eq!(client.duration_for("hi"), MIN_DURATION_MS);
        assert_eq!(client.duration_for(&"x".repeat(100_000)), MAX_DURATION_MS);
    }
}
