//! Narrator - 单槽 TTS 播放服务
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Playback Context: 音色、播放速度、文本指纹、最近播放记录、阶段推导
//!
//! 应用层 (application/):
//! - Ports: TtsEngine, AudioCache, PreferenceStore, PlaybackEngine, AudioSaver
//! - Controller: SessionController 状态机 + ControllerWorker actor
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Adapters: HTTP/Fake TTS Client, CachingTtsEngine, ClockPlaybackEngine, FileAudioSaver
//! - Persistence: Sled 音频缓存与偏好存储
//! - Memory: 内存偏好存储
//! - Events: 状态与事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
