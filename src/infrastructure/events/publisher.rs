//! Event Publisher Implementation
//!
//! 最新状态通过 watch 保存，离散事件通过 broadcast 推送给 WebSocket 客户端

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

use crate::application::controller::PlaybackState;

/// 推送给客户端的事件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum PlayerEvent {
    /// 状态快照变化
    StateChanged { state: serde_json::Value },
    /// 新会话已加载（生成或恢复）
    SessionLoaded {
        handle_id: Uuid,
        label: String,
        audio_url: String,
        restored: bool,
    },
    /// 生成失败
    GenerationFailed { label: String, error: String },
}

/// 事件发布器
pub struct EventPublisher {
    state: watch::Sender<PlaybackState>,
    channel: broadcast::Sender<PlayerEvent>,
}

impl EventPublisher {
    pub fn new(initial: PlaybackState) -> Self {
        let (state, _) = watch::channel(initial);
        let (channel, _) = broadcast::channel(100);
        Self { state, channel }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅状态变化
    pub fn subscribe_state(&self) -> watch::Receiver<PlaybackState> {
        self.state.subscribe()
    }

    /// 订阅离散事件
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.channel.subscribe()
    }

    /// 最近发布的状态
    pub fn latest(&self) -> PlaybackState {
        self.state.borrow().clone()
    }

    /// 发布状态；与上次相同时不通知
    pub fn publish_state(&self, state: PlaybackState) {
        let changed = self.state.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state.clone();
            true
        });

        if changed {
            match serde_json::to_value(&state) {
                Ok(value) => self.send(PlayerEvent::StateChanged { state: value }),
                Err(e) => tracing::warn!(error = %e, "Failed to serialize playback state"),
            }
        }
    }

    /// 发布会话加载事件
    pub fn publish_session_loaded(&self, handle_id: Uuid, label: &str, audio_url: &str, restored: bool) {
        self.send(PlayerEvent::SessionLoaded {
            handle_id,
            label: label.to_string(),
            audio_url: audio_url.to_string(),
            restored,
        });
    }

    /// 发布生成失败事件
    pub fn publish_generation_failed(&self, label: &str, error: &str) {
        self.send(PlayerEvent::GenerationFailed {
            label: label.to_string(),
            error: error.to_string(),
        });
    }

    fn send(&self, event: PlayerEvent) {
        if let Err(e) = self.channel.send(event) {
            tracing::debug!(error = %e, "Failed to publish event (no receivers)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::playback::{PlaybackPhase, PlaybackSpeed, VoiceName};

    fn idle_state() -> PlaybackState {
        PlaybackState {
            phase: PlaybackPhase::Idle,
            handle_id: None,
            audio_url: None,
            generating_for: None,
            playing_for: None,
            is_playing: false,
            is_restoring: false,
            current_time: 0.0,
            duration: 0.0,
            playback_speed: PlaybackSpeed::NORMAL,
            error: None,
            selected_voice: VoiceName::Charon,
            identity: None,
        }
    }

    #[tokio::test]
    async fn test_unchanged_state_is_not_rebroadcast() {
        let publisher = EventPublisher::new(idle_state());
        let mut events = publisher.subscribe();

        publisher.publish_state(idle_state());
        assert!(events.try_recv().is_err());

        let generating = PlaybackState {
            phase: PlaybackPhase::Generating,
            generating_for: Some("clip A".to_string()),
            ..idle_state()
        };
        publisher.publish_state(generating.clone());

        match events.try_recv().unwrap() {
            PlayerEvent::StateChanged { state } => {
                assert_eq!(state["phase"], "generating");
                assert_eq!(state["generatingFor"], "clip A");
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(publisher.latest(), generating);
    }

    #[test]
    fn test_event_wire_format() {
        let event = PlayerEvent::GenerationFailed {
            label: "clip A".to_string(),
            error: "Request timeout".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "GenerationFailed");
        assert_eq!(json["data"]["error"], "Request timeout");
    }
}
