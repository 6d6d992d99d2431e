//! Playback Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PlaybackError {
    #[error("未知音色: {0}")]
    UnknownVoice(String),

    #[error("无效的播放速度: {0}")]
    InvalidSpeed(f32),
}
