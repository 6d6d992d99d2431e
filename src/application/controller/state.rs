//! 控制器对外快照

use serde::Serialize;
use uuid::Uuid;

use crate::domain::playback::{PlaybackIdentity, PlaybackPhase, PlaybackSpeed, VoiceName};

/// 播放状态快照
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub phase: PlaybackPhase,
    /// 当前可播放引用
    pub handle_id: Option<Uuid>,
    pub audio_url: Option<String>,
    /// 正在生成的片段标签
    pub generating_for: Option<String>,
    /// 正在播放的片段标签；播放结束、出错或 stop 后为 None，暂停时保留
    pub playing_for: Option<String>,
    pub is_playing: bool,
    pub is_restoring: bool,
    /// 秒
    pub current_time: f64,
    /// 秒，metadata 加载前为 0
    pub duration: f64,
    pub playback_speed: PlaybackSpeed,
    pub error: Option<String>,
    pub selected_voice: VoiceName,
    pub identity: Option<PlaybackIdentity>,
}
