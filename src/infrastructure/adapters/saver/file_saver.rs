//! File Saver - 把下载的音频写入下载目录
//!
//! 实现 AudioSaverPort trait

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{AudioBytes, AudioSaverPort, SaveError};

/// 文件名最大长度
const MAX_FILENAME_LEN: usize = 128;

/// 文件系统音频保存
pub struct FileAudioSaver {
    /// 下载目录
    download_dir: PathBuf,
}

impl FileAudioSaver {
    pub fn new(download_dir: impl AsRef<Path>) -> Self {
        Self {
            download_dir: download_dir.as_ref().to_path_buf(),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }
}

/// 只保留文件名中安全的字符，去掉任何路径成分
pub fn sanitize_filename(filename: &str) -> Result<String, SaveError> {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILENAME_LEN)
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();

    if cleaned.is_empty() {
        return Err(SaveError::InvalidFilename(filename.to_string()));
    }
    Ok(cleaned)
}

#[async_trait]
impl AudioSaverPort for FileAudioSaver {
    async fn save(&self, audio: AudioBytes, filename: &str) -> Result<PathBuf, SaveError> {
        let name = sanitize_filename(filename)?;

        fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|e| SaveError::IoError(e.to_string()))?;

        let path = self.download_dir.join(name);
        fs::write(&path, &audio[..])
            .await
            .map_err(|e| SaveError::IoError(e.to_string()))?;

        tracing::debug!(path = %path.display(), size = audio.len(), "Saved audio");

        Ok(path)
    }
}
