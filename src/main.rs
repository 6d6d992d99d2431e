//! Narrator - 单槽 TTS 播放服务
//!
//! 启动顺序: 配置 → 日志 → 适配器 → 控制器 actor（先恢复最近播放）→ HTTP

use std::sync::Arc;

use narrator::application::{
    AudioCachePort, ControllerWorker, PlaybackEnginePort, Preferences, SessionController,
    TtsEnginePort,
};
use narrator::config::{load_config, print_config, LogConfig, TtsConfig, TtsProvider};
use narrator::infrastructure::adapters::{
    CachingTtsEngine, ClockEngineConfig, ClockPlaybackEngine, FakeTtsClient, FileAudioSaver,
    HttpTtsClient, HttpTtsClientConfig,
};
use narrator::infrastructure::events::EventPublisher;
use narrator::infrastructure::http::{AppState, HttpServer};
use narrator::infrastructure::persistence::{SledAudioCache, SledPreferenceStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);

    tracing::info!("Narrator - 单槽 TTS 播放服务");
    print_config(&config);

    tokio::fs::create_dir_all(&config.storage.download_dir).await?;

    // 持久化：音频缓存 + 偏好设置
    let audio_cache = Arc::new(SledAudioCache::open(
        &config.cache.path,
        config.cache.max_size_bytes,
    )?);
    let preference_store = Arc::new(SledPreferenceStore::open(&config.preferences.path)?);

    // TTS 引擎，外层包一层缓存
    let tts_engine: Arc<dyn TtsEnginePort> = Arc::new(CachingTtsEngine::new(
        build_tts_engine(&config.tts)?,
        audio_cache.clone(),
    ));

    let playback_engine = ClockPlaybackEngine::new(ClockEngineConfig {
        autoplay_allowed: config.playback.autoplay_allowed,
        tick_ms: config.playback.tick_ms,
    })
    .arc();
    let audio_saver = Arc::new(FileAudioSaver::new(&config.storage.download_dir));

    // 控制器 actor
    let controller = SessionController::new(
        Preferences::new(preference_store.clone()),
        playback_engine.clone(),
        config.voice.default.as_deref(),
    );
    let event_publisher = EventPublisher::new(controller.snapshot()).arc();
    let (controller_handle, controller_task) = ControllerWorker::spawn(
        controller,
        tts_engine,
        audio_cache.clone(),
        audio_saver,
        event_publisher,
    );

    // HTTP 服务器
    let playback_engine: Arc<dyn PlaybackEnginePort> = playback_engine;
    let cache_port: Arc<dyn AudioCachePort> = audio_cache.clone();
    let state = AppState::new(controller_handle.clone(), playback_engine, cache_port);
    let server = HttpServer::new(config.server.clone(), state);

    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                return;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    // 释放当前会话并等待 actor 退出
    if let Err(e) = controller_handle.shutdown().await {
        tracing::warn!(error = %e, "Controller already stopped");
    }
    if let Err(e) = controller_task.await {
        tracing::error!(error = %e, "Controller task panicked");
    }

    if let Err(e) = audio_cache.flush() {
        tracing::warn!(error = %e, "Failed to flush audio cache");
    }
    if let Err(e) = preference_store.flush() {
        tracing::warn!(error = %e, "Failed to flush preferences");
    }

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// 初始化日志；`RUST_LOG` 优先于配置
fn init_tracing(log: &LogConfig) {
    let log_filter = format!("{},narrator={},tower_http=debug", log.level, log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_tts_engine(config: &TtsConfig) -> anyhow::Result<Arc<dyn TtsEnginePort>> {
    let engine: Arc<dyn TtsEnginePort> = match config.provider {
        TtsProvider::Http => {
            let client_config = HttpTtsClientConfig::new(&config.url)
                .with_timeout(config.timeout_secs)
                .with_retries(config.max_retries);
            Arc::new(HttpTtsClient::new(client_config)?)
        }
        TtsProvider::Fake => {
            tracing::warn!("Using FakeTtsClient: generated audio is silence");
            Arc::new(FakeTtsClient::with_defaults())
        }
    };
    Ok(engine)
}
