//! Caching TTS Engine - 带内容寻址缓存的生成网关
//!
//! 推理前按 (md5(text), voice) 查缓存，推理成功后写回。
//! 缓存读写失败只记录日志，不影响生成结果

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::ports::{
    AudioCachePort, CacheMetadata, InferRequest, InferResponse, TtsEnginePort, TtsError,
};
use crate::domain::playback::TextFingerprint;

pub struct CachingTtsEngine {
    inner: Arc<dyn TtsEnginePort>,
    cache: Arc<dyn AudioCachePort>,
}

impl CachingTtsEngine {
    pub fn new(inner: Arc<dyn TtsEnginePort>, cache: Arc<dyn AudioCachePort>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl TtsEnginePort for CachingTtsEngine {
    async fn infer(&self, request: InferRequest) -> Result<InferResponse, TtsError> {
        let fingerprint = TextFingerprint::of(&request.text);

        match self.cache.get(&fingerprint, request.voice).await {
            Ok(Some(audio_data)) => {
                tracing::debug!(fingerprint = %fingerprint, voice = %request.voice, "Cache hit");
                let mut response = InferResponse::from_audio(audio_data);
                response.cached = true;
                return Ok(response);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(fingerprint = %fingerprint, error = %e, "Cache lookup failed, generating");
            }
        }

        let voice = request.voice;
        let response = self.inner.infer(request).await?;

        let metadata = CacheMetadata {
            duration_ms: response.duration_ms,
            sample_rate: response.sample_rate,
        };
        if let Err(e) = self
            .cache
            .put(&fingerprint, voice, response.audio_data.clone(), metadata)
            .await
        {
            tracing::warn!(fingerprint = %fingerprint, error = %e, "Failed to cache generated audio");
        }

        Ok(response)
    }

    async fn health_check(&self) -> bool {
        self.inner.health_check().await
    }
}
