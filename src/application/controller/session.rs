//! AudioSession - 唯一的活动音频单元

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::application::ports::{AudioBytes, LoadedAudio, PlayableHandle, PlaybackEvent};
use crate::domain::playback::{PlaybackIdentity, SessionStatus};

/// 活动音频会话
///
/// 由控制器独占持有；handle 只能通过 `into_handle` 取出用于释放
#[derive(Debug)]
pub struct AudioSession {
    audio: AudioBytes,
    handle: PlayableHandle,
    events: Option<mpsc::UnboundedReceiver<PlaybackEvent>>,
    identity: PlaybackIdentity,
    pub(super) position: f64,
    pub(super) duration: f64,
    pub(super) status: SessionStatus,
    /// 播放器报告错误后为 false
    pub(super) usable: bool,
    /// 已发出但尚未收到 Seeked 的跳转数
    pub(super) pending_seeks: u32,
}

impl AudioSession {
    pub(super) fn new(audio: AudioBytes, loaded: LoadedAudio, identity: PlaybackIdentity) -> Self {
        Self {
            audio,
            handle: loaded.handle,
            events: Some(loaded.events),
            identity,
            position: 0.0,
            duration: 0.0,
            status: SessionStatus::Paused,
            usable: true,
            pending_seeks: 0,
        }
    }

    pub fn handle(&self) -> &PlayableHandle {
        &self.handle
    }

    pub fn handle_id(&self) -> Uuid {
        self.handle.id()
    }

    pub fn audio(&self) -> &AudioBytes {
        &self.audio
    }

    pub fn identity(&self) -> &PlaybackIdentity {
        &self.identity
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_usable(&self) -> bool {
        self.usable
    }

    /// 等待该会话播放器的下一个事件；订阅关闭后永久挂起
    pub(super) async fn next_event(&mut self) -> PlaybackEvent {
        if let Some(events) = self.events.as_mut() {
            if let Some(event) = events.recv().await {
                return event;
            }
            tracing::debug!(handle_id = %self.handle.id(), "Player event stream closed");
            self.events = None;
        }
        std::future::pending().await
    }

    /// 丢弃事件订阅，交出 handle
    pub(super) fn into_handle(self) -> PlayableHandle {
        self.handle
    }
}
