//! 类型化的偏好设置访问
//!
//! 读取失败一律视为缺失（记录日志），写入失败返回给调用方决定

use std::sync::Arc;

use crate::application::ports::{PreferenceError, PreferenceKey, PreferenceStorePort};
use crate::domain::playback::{PlaybackIdentity, PlaybackSpeed, VoiceName};

#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn PreferenceStorePort>,
}

impl Preferences {
    pub fn new(store: Arc<dyn PreferenceStorePort>) -> Self {
        Self { store }
    }

    fn read(&self, key: PreferenceKey) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = key.as_str(), error = %e, "Failed to read preference");
                None
            }
        }
    }

    /// 初始音色：持久化值 > 环境默认值 > 兜底
    pub fn voice(&self, env_default: Option<&str>) -> VoiceName {
        VoiceName::resolve(self.read(PreferenceKey::VoicePreference).as_deref(), env_default)
    }

    pub fn save_voice(&self, voice: VoiceName) -> Result<(), PreferenceError> {
        self.store.set(PreferenceKey::VoicePreference, voice.as_str())
    }

    pub fn speed(&self) -> PlaybackSpeed {
        PlaybackSpeed::from_stored(self.read(PreferenceKey::PlaybackSpeed).as_deref())
    }

    pub fn save_speed(&self, speed: PlaybackSpeed) -> Result<(), PreferenceError> {
        self.store.set(PreferenceKey::PlaybackSpeed, &speed.to_stored())
    }

    /// 最近播放记录；损坏的记录视为缺失
    pub fn last_played(&self) -> Option<PlaybackIdentity> {
        let raw = self.read(PreferenceKey::LastPlayedAudio)?;
        match serde_json::from_str(&raw) {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring corrupt last played record");
                None
            }
        }
    }

    /// 整条记录一次写入
    pub fn save_last_played(&self, identity: &PlaybackIdentity) -> Result<(), PreferenceError> {
        let raw = serde_json::to_string(identity).map_err(|e| PreferenceError::InvalidValue {
            key: PreferenceKey::LastPlayedAudio.as_str(),
            reason: e.to_string(),
        })?;
        self.store.set(PreferenceKey::LastPlayedAudio, &raw)
    }
}
