//! Session Controller - 单槽播放状态机
//!
//! 协调三件事：异步生成、内容寻址缓存恢复、单一播放会话。
//! 所有替换会话的路径都经过 `install_session`：先释放旧引用，再创建新引用。

use std::sync::Arc;
use uuid::Uuid;

use super::preferences::Preferences;
use super::session::AudioSession;
use super::state::PlaybackState;
use crate::application::ports::{
    AudioBytes, CacheError, EngineError, PlaybackEnginePort, PlaybackEvent, StartCause, TtsError,
};
use crate::domain::playback::{
    PlaybackIdentity, PlaybackPhase, PlaybackSpeed, SessionStatus, VoiceName,
};

/// 播放失败时对外显示的错误信息
pub const PLAYBACK_FAILED: &str = "playback failed";

/// 一次生成请求的凭据，按发起顺序递增
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    pub seq: u64,
    pub text: String,
    pub voice: VoiceName,
    pub label: String,
}

/// 生成完成后的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// 新会话已加载
    Loaded(PlaybackIdentity),
    /// 失败信息已写入错误槽
    Failed(String),
    /// 已有更新的请求生效，结果被丢弃
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RestorePhase {
    Pending,
    Running,
    Done,
}

pub struct SessionController {
    preferences: Preferences,
    engine: Arc<dyn PlaybackEnginePort>,
    session: Option<AudioSession>,
    selected_voice: VoiceName,
    speed: PlaybackSpeed,
    error: Option<String>,
    generating_for: Option<String>,
    /// 加载时设为会话标签；结束、出错、stop 时清空，暂停时保留
    playing_for: Option<String>,
    /// 最近一次发起的生成序号
    issued_seq: u64,
    /// 最近一次生效（成功加载或报告失败）的生成序号
    resolved_seq: u64,
    restore: RestorePhase,
}

impl SessionController {
    pub fn new(
        preferences: Preferences,
        engine: Arc<dyn PlaybackEnginePort>,
        default_voice: Option<&str>,
    ) -> Self {
        let selected_voice = preferences.voice(default_voice);
        let speed = preferences.speed();

        tracing::info!(voice = %selected_voice, speed = %speed, "SessionController initialized");

        Self {
            preferences,
            engine,
            session: None,
            selected_voice,
            speed,
            error: None,
            generating_for: None,
            playing_for: None,
            issued_seq: 0,
            resolved_seq: 0,
            restore: RestorePhase::Pending,
        }
    }

    pub fn selected_voice(&self) -> VoiceName {
        self.selected_voice
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    pub fn session(&self) -> Option<&AudioSession> {
        self.session.as_ref()
    }

    pub fn is_restoring(&self) -> bool {
        self.restore == RestorePhase::Running
    }

    // ========== 启动恢复 ==========

    /// 读取最近播放记录，开始恢复；整个生命周期只会返回一次 Some
    pub fn begin_restore(&mut self) -> Option<PlaybackIdentity> {
        if self.restore != RestorePhase::Pending {
            tracing::debug!("Restoration already attempted, skipping");
            return None;
        }

        match self.preferences.last_played() {
            Some(identity) => {
                tracing::info!(
                    label = %identity.label,
                    fingerprint = %identity.text_fingerprint,
                    voice = %identity.voice,
                    "Restoring last played audio"
                );
                self.restore = RestorePhase::Running;
                Some(identity)
            }
            None => {
                self.restore = RestorePhase::Done;
                None
            }
        }
    }

    /// 处理缓存查找结果；缺失和失败同等对待，都不会报告给用户
    ///
    /// 返回是否加载了会话
    pub fn finish_restore(
        &mut self,
        identity: PlaybackIdentity,
        lookup: Result<Option<Vec<u8>>, CacheError>,
    ) -> bool {
        if self.restore != RestorePhase::Running {
            return false;
        }
        self.restore = RestorePhase::Done;

        if self.issued_seq > 0 {
            tracing::info!(label = %identity.label, "User generation took precedence, dropping restored audio");
            return false;
        }

        match lookup {
            Ok(Some(audio)) => {
                tracing::info!(label = %identity.label, "Restored last played audio from cache");
                self.install_session(audio.into(), identity)
            }
            Ok(None) => {
                tracing::info!(label = %identity.label, "Last played audio no longer cached");
                false
            }
            Err(e) => {
                tracing::warn!(label = %identity.label, error = %e, "Failed to restore audio");
                false
            }
        }
    }

    // ========== 生成 ==========

    /// 清空错误槽并登记一次新的生成请求
    pub fn begin_generation(&mut self, text: String, label: String) -> GenerationTicket {
        self.error = None;
        self.issued_seq += 1;
        self.generating_for = Some(label.clone());

        tracing::info!(seq = self.issued_seq, label = %label, voice = %self.selected_voice, "Generation requested");

        GenerationTicket {
            seq: self.issued_seq,
            text,
            voice: self.selected_voice,
            label,
        }
    }

    /// 处理生成结果
    ///
    /// 以发起顺序为准：比已生效请求更早的结果直接丢弃。
    /// 失败时保留当前会话不动。
    pub async fn complete_generation(
        &mut self,
        ticket: GenerationTicket,
        result: Result<Vec<u8>, TtsError>,
    ) -> GenerationOutcome {
        if ticket.seq == self.issued_seq {
            self.generating_for = None;
        }

        if ticket.seq < self.resolved_seq {
            tracing::debug!(
                seq = ticket.seq,
                resolved_seq = self.resolved_seq,
                label = %ticket.label,
                "Discarding superseded generation result"
            );
            return GenerationOutcome::Superseded;
        }
        self.resolved_seq = ticket.seq;

        let audio = match result {
            Ok(audio) => audio,
            Err(e) => {
                tracing::warn!(label = %ticket.label, error = %e, "Audio generation failed");
                let message = e.to_string();
                self.error = Some(message.clone());
                return GenerationOutcome::Failed(message);
            }
        };

        self.error = None;
        let identity = PlaybackIdentity::new(&ticket.text, ticket.voice, ticket.label);
        if !self.install_session(audio.into(), identity.clone()) {
            return GenerationOutcome::Failed(PLAYBACK_FAILED.to_string());
        }

        if let Err(e) = self.preferences.save_last_played(&identity) {
            tracing::warn!(error = %e, "Failed to persist last played audio");
        }

        self.start(StartCause::Autoplay).await;
        GenerationOutcome::Loaded(identity)
    }

    // ========== 会话替换 ==========

    /// 释放旧引用后创建新会话（初始暂停）
    fn install_session(&mut self, audio: AudioBytes, identity: PlaybackIdentity) -> bool {
        self.release_current();

        match self.engine.create(audio.clone(), self.speed) {
            Ok(loaded) => {
                let session = AudioSession::new(audio, loaded, identity);
                tracing::info!(
                    handle_id = %session.handle_id(),
                    label = %session.identity().label,
                    audio_size = session.audio().len(),
                    "Audio session created"
                );
                self.playing_for = Some(session.identity().label.clone());
                self.session = Some(session);
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create playable reference");
                self.error = Some(PLAYBACK_FAILED.to_string());
                false
            }
        }
    }

    fn release_current(&mut self) {
        self.playing_for = None;
        if let Some(previous) = self.session.take() {
            let handle = previous.into_handle();
            tracing::debug!(handle_id = %handle.id(), "Releasing playable reference");
            self.engine.release(handle);
        }
    }

    async fn start(&mut self, cause: StartCause) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match self.engine.start(session.handle(), cause).await {
            Ok(()) => {
                session.status = SessionStatus::Playing;
                self.playing_for = Some(session.identity().label.clone());
            }
            Err(EngineError::AutoplayBlocked) => {
                tracing::info!(handle_id = %session.handle_id(), "Autoplay blocked, session left paused");
                session.status = SessionStatus::Paused;
            }
            Err(e) => {
                tracing::warn!(handle_id = %session.handle_id(), error = %e, "Failed to start playback");
                session.usable = false;
                session.status = SessionStatus::Paused;
                self.error = Some(PLAYBACK_FAILED.to_string());
            }
        }
    }

    // ========== 播放控制 ==========

    pub async fn play(&mut self) {
        let Some(session) = self.session.as_mut().filter(|s| s.usable) else {
            tracing::debug!("play() without a playable session, ignoring");
            return;
        };

        // 播放结束后重新播放从头开始
        if session.status == SessionStatus::Ended {
            seek_player(self.engine.as_ref(), session, 0.0);
        }

        self.start(StartCause::UserGesture).await;
    }

    pub fn pause(&mut self) {
        let Some(session) = self.session.as_mut().filter(|s| s.usable) else {
            tracing::debug!("pause() without a playable session, ignoring");
            return;
        };

        self.engine.pause(session.handle());
        if session.status == SessionStatus::Playing {
            session.status = SessionStatus::Paused;
        }
    }

    /// 暂停并回到开头，会话保持加载
    pub fn stop(&mut self) {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("stop() without a session, ignoring");
            return;
        };

        self.engine.pause(session.handle());
        seek_player(self.engine.as_ref(), session, 0.0);
        session.status = SessionStatus::Paused;
        self.playing_for = None;
    }

    /// 跳转，位置 clamp 到 [0, duration]
    pub fn seek(&mut self, position: f64) {
        let Some(session) = self.session.as_mut().filter(|s| s.usable) else {
            tracing::debug!("seek() without a playable session, ignoring");
            return;
        };

        let target = clamp_position(position, session.duration);
        seek_player(self.engine.as_ref(), session, target);
        if session.status == SessionStatus::Ended {
            session.status = SessionStatus::Paused;
        }
    }

    /// 立即持久化；有会话时同时作用于当前播放器
    pub fn set_playback_speed(&mut self, speed: PlaybackSpeed) {
        self.speed = speed;
        if let Err(e) = self.preferences.save_speed(speed) {
            tracing::warn!(error = %e, "Failed to persist playback speed");
        }
        if let Some(session) = self.session.as_ref() {
            self.engine.set_speed(session.handle(), speed);
        }
    }

    /// 立即持久化；只影响下一次生成
    pub fn set_voice(&mut self, voice: VoiceName) {
        self.selected_voice = voice;
        if let Err(e) = self.preferences.save_voice(voice) {
            tracing::warn!(error = %e, "Failed to persist voice preference");
        }
    }

    /// 当前会话的原始字节
    pub fn download(&self) -> Option<AudioBytes> {
        self.session.as_ref().map(|s| s.audio().clone())
    }

    // ========== 播放器事件 ==========

    /// 等待当前会话播放器的下一个事件；无会话时永久挂起
    pub async fn next_event(&mut self) -> (Uuid, PlaybackEvent) {
        match self.session.as_mut() {
            Some(session) => {
                let handle_id = session.handle_id();
                (handle_id, session.next_event().await)
            }
            None => std::future::pending().await,
        }
    }

    pub fn handle_event(&mut self, handle_id: Uuid, event: PlaybackEvent) {
        let Some(session) = self
            .session
            .as_mut()
            .filter(|s| s.handle_id() == handle_id)
        else {
            tracing::debug!(handle_id = %handle_id, "Dropping event from released player");
            return;
        };

        match event {
            PlaybackEvent::MetadataLoaded { duration } => {
                session.duration = if duration.is_finite() && duration > 0.0 {
                    duration
                } else {
                    0.0
                };
            }
            PlaybackEvent::TimeUpdate { position } => {
                if session.pending_seeks > 0 {
                    tracing::trace!(handle_id = %handle_id, position, "Dropping progress queued before seek");
                } else if position.is_finite() {
                    session.position = position.max(0.0);
                }
            }
            PlaybackEvent::Seeked { position } => {
                session.pending_seeks = session.pending_seeks.saturating_sub(1);
                tracing::trace!(handle_id = %handle_id, position, pending = session.pending_seeks, "Seek applied");
            }
            PlaybackEvent::Ended if session.pending_seeks > 0 => {
                // 跳转前已播完：保留跳转目标位置，播放器已停止
                tracing::debug!(handle_id = %handle_id, "Playback ended before seek was applied");
                if session.status == SessionStatus::Playing {
                    session.status = SessionStatus::Paused;
                }
                self.playing_for = None;
            }
            PlaybackEvent::Ended => {
                tracing::debug!(handle_id = %handle_id, "Playback ended");
                session.status = SessionStatus::Ended;
                session.position = 0.0;
                self.playing_for = None;
            }
            PlaybackEvent::Error { message } => {
                tracing::warn!(handle_id = %handle_id, error = %message, "Player reported an error");
                session.usable = false;
                session.status = SessionStatus::Paused;
                self.error = Some(PLAYBACK_FAILED.to_string());
                self.playing_for = None;
            }
        }
    }

    /// 释放当前会话
    pub fn shutdown(&mut self) {
        self.release_current();
        tracing::info!("SessionController shut down");
    }

    pub fn snapshot(&self) -> PlaybackState {
        let session = self.session.as_ref();
        PlaybackState {
            phase: PlaybackPhase::derive(
                self.generating_for.is_some(),
                self.error.is_some(),
                session.map(|s| s.status),
            ),
            handle_id: session.map(|s| s.handle_id()),
            audio_url: session.map(|s| s.handle().url().to_string()),
            generating_for: self.generating_for.clone(),
            playing_for: self.playing_for.clone(),
            is_playing: session.is_some_and(|s| s.status == SessionStatus::Playing),
            is_restoring: self.is_restoring(),
            current_time: session.map_or(0.0, |s| s.position),
            duration: session.map_or(0.0, |s| s.duration),
            playback_speed: self.speed,
            error: self.error.clone(),
            selected_voice: self.selected_voice,
            identity: session.map(|s| s.identity().clone()),
        }
    }
}

/// 跳转播放器；对应的 Seeked 到达前，排队中的进度事件作废
fn seek_player(engine: &dyn PlaybackEnginePort, session: &mut AudioSession, position: f64) {
    engine.seek(session.handle(), position);
    session.position = position;
    session.pending_seeks += 1;
}

fn clamp_position(position: f64, duration: f64) -> f64 {
    if position.is_nan() {
        return 0.0;
    }
    let upper = if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        0.0
    };
    position.clamp(0.0, upper)
}
