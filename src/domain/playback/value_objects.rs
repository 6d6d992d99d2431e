//! Playback Context - Value Objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::PlaybackError;

/// 合成音色
///
/// 预置音色集合，以名称序列化（与偏好存储中的字符串一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoiceName {
    Puck,
    Charon,
    Kore,
    Fenrir,
    Aoede,
    Leda,
    Orus,
    Zephyr,
}

impl VoiceName {
    /// 所有可选音色
    pub const ALL: [VoiceName; 8] = [
        Self::Puck,
        Self::Charon,
        Self::Kore,
        Self::Fenrir,
        Self::Aoede,
        Self::Leda,
        Self::Orus,
        Self::Zephyr,
    ];

    /// 硬编码兜底音色
    pub const FALLBACK: VoiceName = Self::Charon;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Puck => "Puck",
            Self::Charon => "Charon",
            Self::Kore => "Kore",
            Self::Fenrir => "Fenrir",
            Self::Aoede => "Aoede",
            Self::Leda => "Leda",
            Self::Orus => "Orus",
            Self::Zephyr => "Zephyr",
        }
    }

    /// 按优先级解析初始音色：持久化值 > 环境默认值 > 兜底
    ///
    /// 无法识别的候选值会被跳过
    pub fn resolve(persisted: Option<&str>, env_default: Option<&str>) -> Self {
        for (source, candidate) in [("preference", persisted), ("environment", env_default)] {
            let Some(raw) = candidate.map(str::trim).filter(|s| !s.is_empty()) else {
                continue;
            };
            match raw.parse::<VoiceName>() {
                Ok(voice) => return voice,
                Err(_) => {
                    tracing::warn!(source = source, value = %raw, "Ignoring unknown voice");
                }
            }
        }
        Self::FALLBACK
    }
}

impl Default for VoiceName {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl fmt::Display for VoiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoiceName {
    type Err = PlaybackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PlaybackError::UnknownVoice(s.to_string()))
    }
}

/// 播放速度
///
/// 不变量: 有限值，且在 [MIN, MAX] 区间内
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PlaybackSpeed(f32);

impl PlaybackSpeed {
    pub const MIN: f32 = 0.25;
    pub const MAX: f32 = 4.0;
    pub const NORMAL: PlaybackSpeed = PlaybackSpeed(1.0);

    pub fn new(value: f32) -> Result<Self, PlaybackError> {
        if !value.is_finite() || !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(PlaybackError::InvalidSpeed(value));
        }
        Ok(Self(value))
    }

    /// 从持久化文本解析，失败时回退到 1.0
    pub fn from_stored(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::NORMAL;
        };
        match raw.trim().parse::<f32>().ok().and_then(|v| Self::new(v).ok()) {
            Some(speed) => speed,
            None => {
                tracing::warn!(value = %raw, "Ignoring stored playback speed");
                Self::NORMAL
            }
        }
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    /// 持久化文本格式
    pub fn to_stored(&self) -> String {
        self.0.to_string()
    }
}

impl Default for PlaybackSpeed {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}

/// 文本指纹
///
/// md5(text) 的十六进制表示，跨会话稳定，用作缓存和身份 key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextFingerprint(String);

impl TextFingerprint {
    pub fn of(text: &str) -> Self {
        Self(format!("{:x}", md5::compute(text.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TextFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 最近播放记录
///
/// 仅在生成成功后整体写入一次，启动时读取一次
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackIdentity {
    #[serde(alias = "textHash")]
    pub text_fingerprint: TextFingerprint,
    pub voice: VoiceName,
    pub label: String,
}

impl PlaybackIdentity {
    pub fn new(text: &str, voice: VoiceName, label: impl Into<String>) -> Self {
        Self {
            text_fingerprint: TextFingerprint::of(text),
            voice,
            label: label.into(),
        }
    }
}
