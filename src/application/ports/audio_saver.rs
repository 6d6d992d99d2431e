//! Audio Saver Port - 音频下载保存
//!
//! 把当前音频字节交给外部保存机制（fire-and-forget）

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use super::AudioBytes;

/// 保存错误
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Audio Saver Port
#[async_trait]
pub trait AudioSaverPort: Send + Sync {
    /// 保存音频，返回实际写入位置
    async fn save(&self, audio: AudioBytes, filename: &str) -> Result<PathBuf, SaveError>;
}
