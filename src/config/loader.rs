//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, TtsProvider};
use crate::domain::playback::VoiceName;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `NARRATOR_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `NARRATOR_SERVER__PORT=8080`
/// - `NARRATOR_TTS__PROVIDER=fake`
/// - `NARRATOR_VOICE__DEFAULT=Kore`
/// - `NARRATOR_PLAYBACK__AUTOPLAY_ALLOWED=false`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("tts.provider", "http")?
        .set_default("tts.url", "http://localhost:8000")?
        .set_default("tts.timeout_secs", 120)?
        .set_default("tts.max_retries", 0)?
        .set_default("cache.path", "data/cache.sled")?
        .set_default("cache.max_size_bytes", 512_u64 * 1024 * 1024)?
        .set_default("preferences.path", "data/preferences.sled")?
        .set_default("playback.autoplay_allowed", true)?
        .set_default("playback.tick_ms", 250)?
        .set_default("storage.download_dir", "data/downloads")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: NARRATOR_TTS__URL=http://tts-server:8000
    builder = builder.add_source(
        Environment::with_prefix("NARRATOR")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.tts.provider == TtsProvider::Http && config.tts.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS URL cannot be empty for the http provider".to_string(),
        ));
    }

    if config.cache.path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Cache path cannot be empty".to_string(),
        ));
    }

    if config.preferences.path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Preferences path cannot be empty".to_string(),
        ));
    }

    if config.playback.tick_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Playback tick cannot be 0".to_string(),
        ));
    }

    if let Some(voice) = config.voice.default.as_deref() {
        if voice.parse::<VoiceName>().is_err() {
            return Err(ConfigError::ValidationError(format!(
                "Unknown default voice: {}",
                voice
            )));
        }
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("TTS Provider: {:?}", config.tts.provider);
    if config.tts.provider == TtsProvider::Http {
        tracing::info!("TTS URL: {}", config.tts.url);
        tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
        tracing::info!("TTS Max Retries: {}", config.tts.max_retries);
    }
    tracing::info!(
        "Default Voice: {}",
        config.voice.default.as_deref().unwrap_or(VoiceName::FALLBACK.as_str())
    );
    tracing::info!("Cache: {:?} ({} bytes max)", config.cache.path, config.cache.max_size_bytes);
    tracing::info!("Preferences: {:?}", config.preferences.path);
    tracing::info!("Autoplay Allowed: {}", config.playback.autoplay_allowed);
    tracing::info!("Download Directory: {:?}", config.storage.download_dir);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_tts_url_only_matters_for_http() {
        let mut config = AppConfig::default();
        config.tts.url = String::new();
        assert!(validate_config(&config).is_err());

        config.tts.provider = TtsProvider::Fake;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_tick() {
        let mut config = AppConfig::default();
        config.playback.tick_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_of_default_voice() {
        let mut config = AppConfig::default();
        config.voice.default = Some("kore".to_string());
        assert!(validate_config(&config).is_ok());

        config.voice.default = Some("Nobody".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narrator.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9100

[tts]
provider = "fake"

[voice]
default = "Zephyr"

[playback]
autoplay_allowed = false
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.tts.provider, TtsProvider::Fake);
        assert_eq!(config.voice.default.as_deref(), Some("Zephyr"));
        assert!(!config.playback.autoplay_allowed);
        // 未指定的项使用默认值
        assert_eq!(config.playback.tick_ms, 250);
        assert_eq!(config.cache.max_size_bytes, 512 * 1024 * 1024);
    }
}
