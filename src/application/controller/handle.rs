//! SessionControllerHandle - 控制器 actor 的客户端
//!
//! 所有操作只负责投递命令，不等待生成或播放完成

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

use super::commands::ControllerCommand;
use super::state::PlaybackState;
use crate::application::error::ControllerError;
use crate::domain::playback::{PlaybackSpeed, VoiceName};
use crate::infrastructure::events::EventPublisher;

#[derive(Clone)]
pub struct SessionControllerHandle {
    commands: mpsc::Sender<ControllerCommand>,
    publisher: Arc<EventPublisher>,
}

impl SessionControllerHandle {
    pub(super) fn new(commands: mpsc::Sender<ControllerCommand>, publisher: Arc<EventPublisher>) -> Self {
        Self {
            commands,
            publisher,
        }
    }

    async fn send(&self, command: ControllerCommand) -> Result<(), ControllerError> {
        self.commands.send(command).await?;
        Ok(())
    }

    /// 请求生成并播放；空文本被拒绝
    pub async fn generate_and_play(
        &self,
        text: impl Into<String>,
        label: impl Into<String>,
    ) -> Result<(), ControllerError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ControllerError::validation("text must not be empty"));
        }
        self.send(ControllerCommand::GenerateAndPlay {
            text,
            label: label.into(),
        })
        .await
    }

    pub async fn play(&self) -> Result<(), ControllerError> {
        self.send(ControllerCommand::Play).await
    }

    pub async fn pause(&self) -> Result<(), ControllerError> {
        self.send(ControllerCommand::Pause).await
    }

    pub async fn stop(&self) -> Result<(), ControllerError> {
        self.send(ControllerCommand::Stop).await
    }

    pub async fn seek(&self, position: f64) -> Result<(), ControllerError> {
        self.send(ControllerCommand::Seek { position }).await
    }

    pub async fn set_playback_speed(&self, speed: PlaybackSpeed) -> Result<(), ControllerError> {
        self.send(ControllerCommand::SetPlaybackSpeed(speed)).await
    }

    pub async fn set_voice(&self, voice: VoiceName) -> Result<(), ControllerError> {
        self.send(ControllerCommand::SetVoice(voice)).await
    }

    pub async fn download(&self, filename: impl Into<String>) -> Result<(), ControllerError> {
        self.send(ControllerCommand::Download {
            filename: filename.into(),
        })
        .await
    }

    /// 查询当前快照（经过 actor，反映所有已投递的命令）
    pub async fn state(&self) -> Result<PlaybackState, ControllerError> {
        let (reply, rx) = oneshot::channel();
        self.send(ControllerCommand::GetState { reply }).await?;
        Ok(rx.await?)
    }

    /// actor 是否仍在接收命令
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.publisher.subscribe_state()
    }

    pub fn publisher(&self) -> &Arc<EventPublisher> {
        &self.publisher
    }

    /// 释放当前会话并停止 actor
    pub async fn shutdown(&self) -> Result<(), ControllerError> {
        let (reply, rx) = oneshot::channel();
        self.send(ControllerCommand::Shutdown { reply }).await?;
        Ok(rx.await?)
    }
}
