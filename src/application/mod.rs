//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（TtsEngine、AudioCache、PreferenceStore、PlaybackEngine、AudioSaver）
//! - controller: 播放会话控制器及其 actor
//! - error: 应用层错误定义

pub mod controller;
pub mod error;
pub mod ports;

// Re-exports
pub use controller::{
    ControllerWorker, PlaybackState, Preferences, SessionController, SessionControllerHandle,
};

pub use error::ControllerError;

pub use ports::{
    // Audio cache
    generate_cache_key,
    AudioCachePort,
    CacheError,
    CacheMetadata,
    CacheStats,
    // Audio saver
    AudioSaverPort,
    SaveError,
    // Playback engine
    AudioBytes,
    EngineError,
    LoadedAudio,
    PlayableHandle,
    PlaybackEnginePort,
    PlaybackEvent,
    StartCause,
    // Preference store
    PreferenceError,
    PreferenceKey,
    PreferenceStorePort,
    // TTS engine
    InferRequest,
    InferResponse,
    TtsEnginePort,
    TtsError,
};
