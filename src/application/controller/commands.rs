//! Controller Commands - 发往控制器 actor 的消息

use tokio::sync::oneshot;

use super::session_controller::GenerationTicket;
use super::state::PlaybackState;
use crate::application::ports::{CacheError, TtsError};
use crate::domain::playback::{PlaybackIdentity, PlaybackSpeed, VoiceName};

/// 用户命令
#[derive(Debug)]
pub enum ControllerCommand {
    /// 生成并播放
    GenerateAndPlay { text: String, label: String },
    Play,
    Pause,
    /// 暂停并回到开头
    Stop,
    Seek { position: f64 },
    SetPlaybackSpeed(PlaybackSpeed),
    SetVoice(VoiceName),
    /// 把当前音频交给保存机制
    Download { filename: String },
    GetState { reply: oneshot::Sender<PlaybackState> },
    /// 释放当前会话并退出
    Shutdown { reply: oneshot::Sender<()> },
}

/// 后台任务完成后回送的结果
#[derive(Debug)]
pub enum Completion {
    Generation {
        ticket: GenerationTicket,
        result: Result<Vec<u8>, TtsError>,
    },
    Restore {
        identity: PlaybackIdentity,
        result: Result<Option<Vec<u8>>, CacheError>,
    },
}
