//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_cache;
mod audio_saver;
mod playback_engine;
mod preference_store;
mod tts_engine;

pub use audio_cache::{generate_cache_key, AudioCachePort, CacheError, CacheMetadata, CacheStats};
pub use audio_saver::{AudioSaverPort, SaveError};
pub use playback_engine::{
    AudioBytes, EngineError, LoadedAudio, PlayableHandle, PlaybackEnginePort, PlaybackEvent,
    StartCause,
};
pub use preference_store::{PreferenceError, PreferenceKey, PreferenceStorePort};
pub use tts_engine::{InferRequest, InferResponse, TtsEnginePort, TtsError};
