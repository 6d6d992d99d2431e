//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// TTS 引擎配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 音色配置
    #[serde(default)]
    pub voice: VoiceConfig,

    /// 音频缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 偏好存储配置
    #[serde(default)]
    pub preferences: PreferencesConfig,

    /// 播放引擎配置
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// TTS 后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    /// 外部 HTTP TTS 服务
    #[default]
    Http,
    /// 本地静音音频（开发、演示）
    Fake,
}

/// TTS 引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub provider: TtsProvider,

    /// TTS 服务基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    /// 最大重试次数
    #[serde(default)]
    pub max_retries: u32,
}

fn default_tts_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_tts_timeout() -> u64 {
    120
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: TtsProvider::default(),
            url: default_tts_url(),
            timeout_secs: default_tts_timeout(),
            max_retries: 0,
        }
    }
}

/// 音色配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoiceConfig {
    /// 没有持久化偏好时使用的音色
    #[serde(default)]
    pub default: Option<String>,
}

/// 音频缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Sled 数据库路径
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,

    /// 最大缓存大小（字节）
    #[serde(default = "default_cache_max_size")]
    pub max_size_bytes: u64,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("data/cache.sled")
}

fn default_cache_max_size() -> u64 {
    512 * 1024 * 1024 // 512 MB
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            max_size_bytes: default_cache_max_size(),
        }
    }
}

/// 偏好存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct PreferencesConfig {
    /// Sled 数据库路径
    #[serde(default = "default_preferences_path")]
    pub path: PathBuf,
}

fn default_preferences_path() -> PathBuf {
    PathBuf::from("data/preferences.sled")
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_preferences_path(),
        }
    }
}

/// 播放引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// 是否允许生成完成后自动播放
    #[serde(default = "default_autoplay_allowed")]
    pub autoplay_allowed: bool,

    /// 进度事件间隔（毫秒）
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

fn default_autoplay_allowed() -> bool {
    true
}

fn default_tick_ms() -> u64 {
    250
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            autoplay_allowed: default_autoplay_allowed(),
            tick_ms: default_tick_ms(),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 下载保存目录
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("data/downloads")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
