//! Application State
//!
//! HTTP 层共享状态：控制器句柄 + 少量只读端口

use std::sync::Arc;

use crate::application::{AudioCachePort, PlaybackEnginePort, SessionControllerHandle};
use crate::infrastructure::events::EventPublisher;

/// 应用状态
pub struct AppState {
    /// 控制器 actor 句柄，所有播放操作经由它投递
    pub controller: SessionControllerHandle,
    /// 用于解析 `/api/audio/:handle_id`
    pub playback_engine: Arc<dyn PlaybackEnginePort>,
    pub audio_cache: Arc<dyn AudioCachePort>,
    pub event_publisher: Arc<EventPublisher>,
}

impl AppState {
    pub fn new(
        controller: SessionControllerHandle,
        playback_engine: Arc<dyn PlaybackEnginePort>,
        audio_cache: Arc<dyn AudioCachePort>,
    ) -> Self {
        let event_publisher = controller.publisher().clone();
        Self {
            controller,
            playback_engine,
            audio_cache,
            event_publisher,
        }
    }
}
