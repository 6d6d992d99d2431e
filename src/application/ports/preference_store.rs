//! Preference Store Port - 持久化偏好设置
//!
//! 跨重启保留的键值存储：音色、播放速度、最近播放记录

use thiserror::Error;

/// Preference Store 错误
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// 偏好设置条目
///
/// 三个条目相互独立，首次运行时均可缺失
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
    /// 音色名称（字符串）
    VoicePreference,
    /// 播放速度（数字文本）
    PlaybackSpeed,
    /// 最近播放记录（JSON）
    LastPlayedAudio,
}

impl PreferenceKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VoicePreference => "voicePreference",
            Self::PlaybackSpeed => "playbackSpeed",
            Self::LastPlayedAudio => "lastPlayedAudio",
        }
    }
}

/// Preference Store Port
///
/// 每次 set 都是单条原子写入
pub trait PreferenceStorePort: Send + Sync {
    /// 读取条目，不存在时返回 None
    fn get(&self, key: PreferenceKey) -> Result<Option<String>, PreferenceError>;

    /// 写入条目
    fn set(&self, key: PreferenceKey, value: &str) -> Result<(), PreferenceError>;

    /// 删除条目
    fn remove(&self, key: PreferenceKey) -> Result<(), PreferenceError>;
}
