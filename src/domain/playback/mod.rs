//! Playback Context - 播放限界上下文
//!
//! 职责:
//! - 音色 / 播放速度 / 文本指纹等值对象
//! - 最近播放记录 (PlaybackIdentity)
//! - 单槽播放状态机的状态定义

mod errors;
mod state;
mod value_objects;

pub use errors::PlaybackError;
pub use state::{PlaybackPhase, SessionStatus};
pub use value_objects::{PlaybackIdentity, PlaybackSpeed, TextFingerprint, VoiceName};
