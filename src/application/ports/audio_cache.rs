//! Audio Cache Port - 内容寻址音频缓存
//!
//! 定义音频缓存的抽象接口，具体实现使用 Sled (LRU 缓存)

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::playback::{TextFingerprint, VoiceName};

/// Audio Cache 错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache full, eviction failed")]
    EvictionFailed,

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// 缓存元数据
#[derive(Debug, Clone, Default)]
pub struct CacheMetadata {
    pub duration_ms: Option<u64>,
    pub sample_rate: Option<u32>,
}

/// Audio Cache Port
///
/// 基于 text fingerprint + voice 的 LRU 缓存
/// - 缓存 key: md5(text) + voice
#[async_trait]
pub trait AudioCachePort: Send + Sync {
    /// 存储音频数据
    ///
    /// 自动执行 LRU 淘汰以保持缓存大小在限制内
    async fn put(
        &self,
        fingerprint: &TextFingerprint,
        voice: VoiceName,
        audio_data: Vec<u8>,
        metadata: CacheMetadata,
    ) -> Result<(), CacheError>;

    /// 获取音频数据，同时更新 last_accessed（LRU touch）
    async fn get(
        &self,
        fingerprint: &TextFingerprint,
        voice: VoiceName,
    ) -> Result<Option<Vec<u8>>, CacheError>;

    /// 检查缓存是否存在
    async fn exists(&self, fingerprint: &TextFingerprint, voice: VoiceName)
        -> Result<bool, CacheError>;

    /// 删除缓存条目
    async fn remove(&self, fingerprint: &TextFingerprint, voice: VoiceName)
        -> Result<(), CacheError>;

    /// 获取缓存统计信息
    async fn stats(&self) -> CacheStats;
}

/// 缓存统计信息
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_size_bytes: u64,
    pub max_size_bytes: u64,
    pub hit_count: u64,
    pub miss_count: u64,
}

/// 生成缓存 key
pub fn generate_cache_key(fingerprint: &TextFingerprint, voice: VoiceName) -> String {
    format!("{}:{}", fingerprint, voice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_combines_fingerprint_and_voice() {
        let fp = TextFingerprint::of("Hello world");
        assert_eq!(
            generate_cache_key(&fp, VoiceName::Charon),
            "3e25960a79dbc69b674cd4ec67a72c62:Charon"
        );
        assert_ne!(
            generate_cache_key(&fp, VoiceName::Charon),
            generate_cache_key(&fp, VoiceName::Kore)
        );
    }
}
