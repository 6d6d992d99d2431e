//! Playback Engine Port - 播放引擎适配
//!
//! 包装平台的音频渲染原语：一个 playable handle 对应一个播放器，
//! 通过事件通道通知 metadata / 进度 / 结束 / 错误

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::domain::playback::PlaybackSpeed;

/// 共享的原始音频字节
pub type AudioBytes = Arc<[u8]>;

/// Playback Engine 错误
#[derive(Debug, Error)]
pub enum EngineError {
    /// 平台策略拒绝自动播放（不是错误状态）
    #[error("Autoplay blocked by platform policy")]
    AutoplayBlocked,

    #[error("Unknown playable handle: {0}")]
    UnknownHandle(Uuid),

    #[error("Playback failed: {0}")]
    Failed(String),
}

/// 可播放引用
///
/// 不可 Clone：每个 handle 只能被 release 一次
#[derive(Debug, PartialEq, Eq)]
pub struct PlayableHandle {
    id: Uuid,
    url: String,
}

impl PlayableHandle {
    pub fn new(id: Uuid, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 供客户端获取音频的 URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// 播放器事件
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    MetadataLoaded { duration: f64 },
    TimeUpdate { position: f64 },
    /// seek 已生效；在它之前排队的 TimeUpdate / Ended 都属于旧位置
    Seeked { position: f64 },
    Ended,
    Error { message: String },
}

/// 播放开始的触发原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartCause {
    /// 生成完成后自动播放，可能被平台策略拒绝
    Autoplay,
    /// 用户手势触发
    UserGesture,
}

/// 新建的播放器
///
/// `events` 即该会话的唯一订阅，随会话一起丢弃
#[derive(Debug)]
pub struct LoadedAudio {
    pub handle: PlayableHandle,
    pub events: mpsc::UnboundedReceiver<PlaybackEvent>,
}

/// Playback Engine Port
#[async_trait]
pub trait PlaybackEnginePort: Send + Sync {
    /// 从字节创建可播放引用及其播放器（初始暂停）
    ///
    /// 不得阻塞调用方：时长在后台解析，完成后发出 MetadataLoaded 或 Error
    fn create(&self, audio: AudioBytes, speed: PlaybackSpeed) -> Result<LoadedAudio, EngineError>;

    /// 释放可播放引用，之后不再产生事件
    fn release(&self, handle: PlayableHandle);

    /// 开始播放
    async fn start(&self, handle: &PlayableHandle, cause: StartCause) -> Result<(), EngineError>;

    fn pause(&self, handle: &PlayableHandle);

    /// 跳转到指定位置（秒，调用方已完成 clamp），完成后在事件流中发出 Seeked
    fn seek(&self, handle: &PlayableHandle, position: f64);

    fn set_speed(&self, handle: &PlayableHandle, speed: PlaybackSpeed);

    /// 通过 handle id 解析当前仍有效的音频字节
    fn resolve(&self, handle_id: Uuid) -> Option<AudioBytes>;
}
