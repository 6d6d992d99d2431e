//! Sled-based LRU Audio Cache Implementation

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::application::ports::{
    generate_cache_key, AudioCachePort, CacheError, CacheMetadata, CacheStats,
};
use crate::domain::playback::{TextFingerprint, VoiceName};

const ENTRY_PREFIX: &str = "cache:";

/// Sled 缓存配置
#[derive(Debug, Clone)]
pub struct SledCacheConfig {
    /// 数据库路径
    pub db_path: String,
    /// 最大缓存大小（字节）
    pub max_size_bytes: u64,
}

impl Default for SledCacheConfig {
    fn default() -> Self {
        Self {
            db_path: "data/cache.sled".to_string(),
            max_size_bytes: 512 * 1024 * 1024, // 512MB
        }
    }
}

/// 内部缓存条目
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InternalCacheEntry {
    audio_data: Vec<u8>,
    size_bytes: u64,
    fingerprint: String,
    voice: String,
    duration_ms: Option<u64>,
    sample_rate: Option<u32>,
    /// 毫秒时间戳
    last_accessed: i64,
    created_at: i64,
}

/// Sled 音频缓存
pub struct SledAudioCache {
    db: Db,
    max_size_bytes: u64,
    current_size: AtomicU64,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl SledAudioCache {
    /// 创建新的缓存实例
    pub fn new(config: &SledCacheConfig) -> Result<Self, CacheError> {
        let db = sled::open(&config.db_path).map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        // 计算当前缓存大小
        let current_size = Self::calculate_total_size(&db)?;

        tracing::info!(
            db_path = %config.db_path,
            max_size_bytes = config.max_size_bytes,
            current_size = current_size,
            "SledAudioCache initialized"
        );

        Ok(Self {
            db,
            max_size_bytes: config.max_size_bytes,
            current_size: AtomicU64::new(current_size),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        })
    }

    /// 打开现有缓存
    pub fn open<P: AsRef<Path>>(path: P, max_size_bytes: u64) -> Result<Self, CacheError> {
        let config = SledCacheConfig {
            db_path: path.as_ref().to_string_lossy().to_string(),
            max_size_bytes,
        };
        Self::new(&config)
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn entry_key(fingerprint: &TextFingerprint, voice: VoiceName) -> String {
        format!("{}{}", ENTRY_PREFIX, generate_cache_key(fingerprint, voice))
    }

    /// 计算数据库中所有条目的总大小
    fn calculate_total_size(db: &Db) -> Result<u64, CacheError> {
        let mut total = 0u64;
        for item in db.scan_prefix(ENTRY_PREFIX) {
            let (_, value) = item.map_err(|e| CacheError::DatabaseError(e.to_string()))?;
            if let Ok(entry) = bincode::deserialize::<InternalCacheEntry>(&value) {
                total += entry.size_bytes;
            }
        }
        Ok(total)
    }

    /// LRU 淘汰一条；缓存为空时返回 false
    fn evict_lru(&self) -> Result<bool, CacheError> {
        let mut oldest: Option<(sled::IVec, InternalCacheEntry)> = None;

        for item in self.db.scan_prefix(ENTRY_PREFIX) {
            let (key, value) = item.map_err(|e| CacheError::DatabaseError(e.to_string()))?;
            if let Ok(entry) = bincode::deserialize::<InternalCacheEntry>(&value) {
                let is_older = oldest
                    .as_ref()
                    .map(|(_, e)| entry.last_accessed < e.last_accessed)
                    .unwrap_or(true);

                if is_older {
                    oldest = Some((key, entry));
                }
            }
        }

        let Some((key, entry)) = oldest else {
            return Ok(false);
        };

        self.db
            .remove(&key)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        self.current_size.fetch_sub(entry.size_bytes, Ordering::Relaxed);

        tracing::debug!(
            fingerprint = %entry.fingerprint,
            voice = %entry.voice,
            size_bytes = entry.size_bytes,
            "LRU evicted cache entry"
        );
        Ok(true)
    }

    fn remove_key(&self, key: &str) -> Result<(), CacheError> {
        if let Some(data) = self
            .db
            .remove(key)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?
        {
            if let Ok(entry) = bincode::deserialize::<InternalCacheEntry>(&data) {
                self.current_size.fetch_sub(entry.size_bytes, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// 刷新数据库
    pub fn flush(&self) -> Result<(), CacheError> {
        self.db
            .flush()
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl AudioCachePort for SledAudioCache {
    async fn put(
        &self,
        fingerprint: &TextFingerprint,
        voice: VoiceName,
        audio_data: Vec<u8>,
        metadata: CacheMetadata,
    ) -> Result<(), CacheError> {
        let size = audio_data.len() as u64;
        if size > self.max_size_bytes {
            return Err(CacheError::EvictionFailed);
        }

        let key = Self::entry_key(fingerprint, voice);
        // 覆盖写入时先扣除旧条目
        self.remove_key(&key)?;

        // 淘汰以腾出空间
        while self.current_size.load(Ordering::Relaxed) + size > self.max_size_bytes {
            if !self.evict_lru()? {
                return Err(CacheError::EvictionFailed);
            }
        }

        let now = Utc::now().timestamp_millis();
        let entry = InternalCacheEntry {
            audio_data,
            size_bytes: size,
            fingerprint: fingerprint.to_string(),
            voice: voice.to_string(),
            duration_ms: metadata.duration_ms,
            sample_rate: metadata.sample_rate,
            last_accessed: now,
            created_at: now,
        };

        let entry_bytes =
            bincode::serialize(&entry).map_err(|e| CacheError::SerializationError(e.to_string()))?;

        self.db
            .insert(key.as_bytes(), entry_bytes)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        self.current_size.fetch_add(size, Ordering::Relaxed);

        tracing::debug!(
            fingerprint = %fingerprint,
            voice = %voice,
            size_bytes = size,
            "Audio cached"
        );

        Ok(())
    }

    async fn get(
        &self,
        fingerprint: &TextFingerprint,
        voice: VoiceName,
    ) -> Result<Option<Vec<u8>>, CacheError> {
        let key = Self::entry_key(fingerprint, voice);

        match self.db.get(&key) {
            Ok(Some(data)) => {
                let mut entry: InternalCacheEntry = bincode::deserialize(&data)
                    .map_err(|e| CacheError::SerializationError(e.to_string()))?;

                // 更新 last_accessed (LRU touch)
                entry.last_accessed = Utc::now().timestamp_millis();
                let entry_bytes = bincode::serialize(&entry)
                    .map_err(|e| CacheError::SerializationError(e.to_string()))?;
                self.db
                    .insert(key.as_bytes(), entry_bytes)
                    .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

                self.hit_count.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry.audio_data))
            }
            Ok(None) => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Err(e) => Err(CacheError::DatabaseError(e.to_string())),
        }
    }

    async fn exists(&self, fingerprint: &TextFingerprint, voice: VoiceName) -> Result<bool, CacheError> {
        self.db
            .contains_key(Self::entry_key(fingerprint, voice))
            .map_err(|e| CacheError::DatabaseError(e.to_string()))
    }

    async fn remove(&self, fingerprint: &TextFingerprint, voice: VoiceName) -> Result<(), CacheError> {
        self.remove_key(&Self::entry_key(fingerprint, voice))
    }

    async fn stats(&self) -> CacheStats {
        let total_entries = self.db.scan_prefix(ENTRY_PREFIX).count();

        CacheStats {
            total_entries,
            total_size_bytes: self.current_size.load(Ordering::Relaxed),
            max_size_bytes: self.max_size_bytes,
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }
}
