//! Controller Worker - 控制器 actor
//!
//! 独占 `SessionController`，串行处理三类消息：
//! - 用户命令
//! - 后台生成 / 缓存查找的完成结果
//! - 当前会话播放器的事件
//!
//! 每处理完一条消息发布一次状态快照

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::commands::{Completion, ControllerCommand};
use super::handle::SessionControllerHandle;
use super::session_controller::{GenerationOutcome, SessionController};
use crate::application::ports::{AudioCachePort, AudioSaverPort, InferRequest, TtsEnginePort};
use crate::domain::playback::PlaybackIdentity;
use crate::infrastructure::events::EventPublisher;

/// 命令队列容量
const COMMAND_BUFFER: usize = 64;

pub struct ControllerWorker {
    controller: SessionController,
    commands: mpsc::Receiver<ControllerCommand>,
    completion_sender: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    tts_engine: Arc<dyn TtsEnginePort>,
    audio_cache: Arc<dyn AudioCachePort>,
    audio_saver: Arc<dyn AudioSaverPort>,
    event_publisher: Arc<EventPublisher>,
}

impl ControllerWorker {
    /// 启动 actor，返回句柄和任务
    pub fn spawn(
        controller: SessionController,
        tts_engine: Arc<dyn TtsEnginePort>,
        audio_cache: Arc<dyn AudioCachePort>,
        audio_saver: Arc<dyn AudioSaverPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> (SessionControllerHandle, JoinHandle<()>) {
        let (command_sender, commands) = mpsc::channel(COMMAND_BUFFER);
        let (completion_sender, completions) = mpsc::unbounded_channel();

        let worker = Self {
            controller,
            commands,
            completion_sender,
            completions,
            tts_engine,
            audio_cache,
            audio_saver,
            event_publisher: event_publisher.clone(),
        };

        let task = tokio::spawn(worker.run());
        (SessionControllerHandle::new(command_sender, event_publisher), task)
    }

    async fn run(mut self) {
        tracing::info!("ControllerWorker started");

        // 初始化阶段：恢复最近播放
        if let Some(identity) = self.controller.begin_restore() {
            self.spawn_restore(identity);
        }
        self.publish();

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(command) => {
                            if !self.handle_command(command).await {
                                break;
                            }
                        }
                        None => {
                            tracing::info!("All controller handles dropped");
                            self.controller.shutdown();
                            break;
                        }
                    }
                }
                Some(completion) = self.completions.recv() => {
                    self.handle_completion(completion).await;
                }
                (handle_id, event) = self.controller.next_event() => {
                    self.controller.handle_event(handle_id, event);
                }
            }
            self.publish();
        }

        self.publish();
        tracing::info!("ControllerWorker stopped");
    }

    /// 返回 false 表示退出
    async fn handle_command(&mut self, command: ControllerCommand) -> bool {
        match command {
            ControllerCommand::GenerateAndPlay { text, label } => {
                let ticket = self.controller.begin_generation(text, label);
                let tts_engine = self.tts_engine.clone();
                let completions = self.completion_sender.clone();

                tokio::spawn(async move {
                    let request = InferRequest {
                        text: ticket.text.clone(),
                        voice: ticket.voice,
                    };
                    let result = tts_engine.infer(request).await.map(|r| r.audio_data);
                    let _ = completions.send(Completion::Generation { ticket, result });
                });
            }
            ControllerCommand::Play => self.controller.play().await,
            ControllerCommand::Pause => self.controller.pause(),
            ControllerCommand::Stop => self.controller.stop(),
            ControllerCommand::Seek { position } => self.controller.seek(position),
            ControllerCommand::SetPlaybackSpeed(speed) => self.controller.set_playback_speed(speed),
            ControllerCommand::SetVoice(voice) => self.controller.set_voice(voice),
            ControllerCommand::Download { filename } => self.download(filename),
            ControllerCommand::GetState { reply } => {
                let _ = reply.send(self.controller.snapshot());
            }
            ControllerCommand::Shutdown { reply } => {
                self.controller.shutdown();
                self.publish();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    async fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Generation { ticket, result } => {
                let label = ticket.label.clone();
                match self.controller.complete_generation(ticket, result).await {
                    GenerationOutcome::Loaded(_) => self.publish_session_loaded(false),
                    GenerationOutcome::Failed(error) => {
                        self.event_publisher.publish_generation_failed(&label, &error);
                    }
                    GenerationOutcome::Superseded => {}
                }
            }
            Completion::Restore { identity, result } => {
                if self.controller.finish_restore(identity, result) {
                    self.publish_session_loaded(true);
                }
            }
        }
    }

    fn spawn_restore(&self, identity: PlaybackIdentity) {
        let audio_cache = self.audio_cache.clone();
        let completions = self.completion_sender.clone();

        tokio::spawn(async move {
            let result = audio_cache
                .get(&identity.text_fingerprint, identity.voice)
                .await;
            let _ = completions.send(Completion::Restore { identity, result });
        });
    }

    /// fire-and-forget
    fn download(&self, filename: String) {
        let Some(audio) = self.controller.download() else {
            tracing::debug!("download() without a session, ignoring");
            return;
        };
        let audio_saver = self.audio_saver.clone();

        tokio::spawn(async move {
            match audio_saver.save(audio, &filename).await {
                Ok(path) => tracing::info!(path = %path.display(), "Audio saved"),
                Err(e) => tracing::warn!(filename = %filename, error = %e, "Failed to save audio"),
            }
        });
    }

    fn publish_session_loaded(&self, restored: bool) {
        if let Some(session) = self.controller.session() {
            self.event_publisher.publish_session_loaded(
                session.handle_id(),
                &session.identity().label,
                session.handle().url(),
                restored,
            );
        }
    }

    fn publish(&self) {
        self.event_publisher.publish_state(self.controller.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::controller::testing::{
        MemoryAudioCache, RecordingPlaybackEngine, RecordingSaver, ScriptedTtsEngine,
    };
    use crate::application::controller::{PlaybackState, Preferences};
    use crate::application::ports::PreferenceStorePort;
    use crate::domain::playback::{PlaybackPhase, VoiceName};
    use crate::infrastructure::adapters::tts::CachingTtsEngine;
    use crate::infrastructure::memory::InMemoryPreferenceStore;
    use std::time::Duration;

    struct Harness {
        handle: SessionControllerHandle,
        task: JoinHandle<()>,
        engine: Arc<RecordingPlaybackEngine>,
        saver: Arc<RecordingSaver>,
    }

    fn start(
        store: Arc<InMemoryPreferenceStore>,
        tts: Arc<dyn TtsEnginePort>,
        cache: Arc<MemoryAudioCache>,
    ) -> Harness {
        let engine = RecordingPlaybackEngine::new();
        let saver = RecordingSaver::new();
        let controller = SessionController::new(Preferences::new(store), engine.clone(), None);
        let publisher = EventPublisher::new(controller.snapshot()).arc();
        let (handle, task) = ControllerWorker::spawn(controller, tts, cache, saver.clone(), publisher);
        Harness {
            handle,
            task,
            engine,
            saver,
        }
    }

    async fn wait_for(
        handle: &SessionControllerHandle,
        predicate: impl FnMut(&PlaybackState) -> bool,
    ) -> PlaybackState {
        let mut rx = handle.subscribe();
        let state = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
            .await
            .expect("timed out waiting for state")
            .expect("publisher dropped");
        state.clone()
    }

    #[tokio::test]
    async fn test_hello_world_survives_reload() {
        let store = Arc::new(InMemoryPreferenceStore::new());
        let cache = MemoryAudioCache::new();
        let tts = ScriptedTtsEngine::new();
        let caching: Arc<dyn TtsEnginePort> = Arc::new(CachingTtsEngine::new(tts.clone(), cache.clone()));

        // 首次运行：生成并播放
        let first = start(store.clone(), caching.clone(), cache.clone());
        first.handle.generate_and_play("Hello world", "clip A").await.unwrap();
        let state = wait_for(&first.handle, |s| s.identity.is_some()).await;
        assert_eq!(state.phase, PlaybackPhase::Playing);
        assert_eq!(state.selected_voice, VoiceName::Charon);
        assert_eq!(
            state.identity.as_ref().unwrap().text_fingerprint.as_str(),
            "3e25960a79dbc69b674cd4ec67a72c62"
        );
        assert_eq!(tts.call_count(), 1);

        first.handle.shutdown().await.unwrap();
        first.task.await.unwrap();
        assert_eq!(first.engine.live_handles(), 0);

        // 重新加载：从缓存恢复，不调用生成
        let second = start(store.clone(), caching, cache.clone());
        let state = wait_for(&second.handle, |s| s.identity.is_some() && !s.is_restoring).await;
        assert_eq!(state.phase, PlaybackPhase::Paused);
        assert!(!state.is_playing);
        assert_eq!(state.current_time, 0.0);
        assert_eq!(state.playing_for.as_deref(), Some("clip A"));
        assert!(state.error.is_none());
        assert_eq!(tts.call_count(), 1);
        assert!(second.engine.starts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restore_miss_ends_idle_without_error() {
        let store = Arc::new(InMemoryPreferenceStore::new());
        Preferences::new(store.clone())
            .save_last_played(&PlaybackIdentity::new("gone", VoiceName::Kore, "old"))
            .unwrap();
        let cache = MemoryAudioCache::new();

        let h = start(store, ScriptedTtsEngine::new(), cache.clone());
        let state = h.handle.state().await.unwrap();
        let state = if state.is_restoring {
            wait_for(&h.handle, |s| !s.is_restoring).await
        } else {
            state
        };

        assert_eq!(state.phase, PlaybackPhase::Idle);
        assert!(state.error.is_none());
        assert_eq!(cache.lookups.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_out_of_order_completion_keeps_last_request() {
        let tts = ScriptedTtsEngine::gated();
        let h = start(Arc::new(InMemoryPreferenceStore::new()), tts.clone(), MemoryAudioCache::new());

        h.handle.generate_and_play("first", "A").await.unwrap();
        h.handle.generate_and_play("second", "B").await.unwrap();

        tts.release("second");
        let state = wait_for(&h.handle, |s| s.identity.is_some()).await;
        assert_eq!(state.playing_for.as_deref(), Some("B"));

        tts.release("first");
        tokio::time::sleep(Duration::from_millis(50)).await;

        let state = h.handle.state().await.unwrap();
        assert_eq!(state.playing_for.as_deref(), Some("B"));
        assert_eq!(h.engine.created_ids().len(), 1);
        assert_eq!(tts.call_count(), 2);
    }

    #[tokio::test]
    async fn test_generation_failure_is_reported() {
        let tts = ScriptedTtsEngine::new();
        tts.fail_on("broken");
        let h = start(Arc::new(InMemoryPreferenceStore::new()), tts, MemoryAudioCache::new());
        let mut events = h.handle.publisher().subscribe();

        h.handle.generate_and_play("broken", "clip X").await.unwrap();
        let state = wait_for(&h.handle, |s| s.error.is_some()).await;
        assert_eq!(state.phase, PlaybackPhase::Errored);
        assert!(state.handle_id.is_none());

        let failed = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if let Ok(crate::infrastructure::events::PlayerEvent::GenerationFailed { label, .. }) =
                    events.recv().await
                {
                    return label;
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(failed, "clip X");
    }

    #[tokio::test]
    async fn test_player_events_drive_progress() {
        let h = start(
            Arc::new(InMemoryPreferenceStore::new()),
            ScriptedTtsEngine::new(),
            MemoryAudioCache::new(),
        );
        h.handle.generate_and_play("Hello world", "clip A").await.unwrap();
        let state = wait_for(&h.handle, |s| s.handle_id.is_some()).await;
        let id = state.handle_id.unwrap();

        h.engine.emit(id, crate::application::ports::PlaybackEvent::MetadataLoaded { duration: 4.0 });
        h.engine.emit(id, crate::application::ports::PlaybackEvent::TimeUpdate { position: 1.5 });
        let state = wait_for(&h.handle, |s| s.current_time == 1.5).await;
        assert_eq!(state.duration, 4.0);

        h.engine.emit(id, crate::application::ports::PlaybackEvent::Ended);
        let state = wait_for(&h.handle, |s| s.phase == PlaybackPhase::Ended).await;
        assert_eq!(state.current_time, 0.0);
    }

    #[tokio::test]
    async fn test_download_hands_bytes_to_saver() {
        let h = start(
            Arc::new(InMemoryPreferenceStore::new()),
            ScriptedTtsEngine::new(),
            MemoryAudioCache::new(),
        );

        // 无会话时忽略
        h.handle.download("nothing.wav").await.unwrap();
        h.handle.state().await.unwrap();
        assert!(h.saver.saved.lock().unwrap().is_empty());

        h.handle.generate_and_play("Hello world", "clip A").await.unwrap();
        wait_for(&h.handle, |s| s.handle_id.is_some()).await;
        h.handle.download("clip-a.wav").await.unwrap();

        tokio::time::timeout(Duration::from_secs(2), h.saver.notify.notified())
            .await
            .unwrap();
        let saved = h.saver.saved.lock().unwrap().clone();
        assert_eq!(
            saved,
            vec![("clip-a.wav".to_string(), ScriptedTtsEngine::audio_for("Hello world").len())]
        );
    }

    #[tokio::test]
    async fn test_settings_persist_through_handle() {
        let store = Arc::new(InMemoryPreferenceStore::new());
        let h = start(store.clone(), ScriptedTtsEngine::new(), MemoryAudioCache::new());

        h.handle.set_voice(VoiceName::Aoede).await.unwrap();
        h.handle
            .set_playback_speed(crate::domain::playback::PlaybackSpeed::new(2.0).unwrap())
            .await
            .unwrap();
        let state = h.handle.state().await.unwrap();

        assert_eq!(state.selected_voice, VoiceName::Aoede);
        assert_eq!(state.playback_speed.value(), 2.0);
        assert_eq!(
            store
                .get(crate::application::ports::PreferenceKey::VoicePreference)
                .unwrap()
                .as_deref(),
            Some("Aoede")
        );
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected_and_closed_handle_errors() {
        let h = start(
            Arc::new(InMemoryPreferenceStore::new()),
            ScriptedTtsEngine::new(),
            MemoryAudioCache::new(),
        );
        assert!(h.handle.generate_and_play("   ", "blank").await.is_err());

        h.handle.shutdown().await.unwrap();
        h.task.await.unwrap();
        assert!(matches!(
            h.handle.play().await,
            Err(crate::application::error::ControllerError::Closed)
        ));
    }
}
