//! Clock Playback Engine - 无头播放引擎
//!
//! 服务端不输出声音：用时钟模拟播放进度，客户端通过
//! `/api/audio/:handle_id` 取得字节自行渲染。
//!
//! - create 立即返回；时长在 blocking 线程上用 symphonia 解析，
//!   完成后发出 MetadataLoaded，无法解码则发出 Error
//! - 播放中每 tick_ms 按速度推进位置，发出 TimeUpdate；时长未知时先等待
//! - 到达结尾发出 Ended 并回到开头
//! - 所有位置相关事件都在持有时钟锁时发出，seek 之后的事件不会早于 Seeked

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::application::ports::{
    AudioBytes, EngineError, LoadedAudio, PlayableHandle, PlaybackEnginePort, PlaybackEvent,
    StartCause,
};
use crate::domain::playback::PlaybackSpeed;
use crate::infrastructure::adapters::audio::probe;

/// 播放引擎配置
#[derive(Debug, Clone)]
pub struct ClockEngineConfig {
    /// 是否允许生成完成后自动播放
    pub autoplay_allowed: bool,
    /// 进度事件间隔（毫秒）
    pub tick_ms: u64,
}

impl Default for ClockEngineConfig {
    fn default() -> Self {
        Self {
            autoplay_allowed: true,
            tick_ms: 250,
        }
    }
}

#[derive(Debug)]
struct Clock {
    position: f64,
    speed: f32,
    playing: bool,
    ticker: Option<JoinHandle<()>>,
}

impl Clock {
    fn stop_ticker(&mut self) {
        self.playing = false;
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

/// 时长解析状态
#[derive(Debug, Clone, Copy, PartialEq)]
enum Metadata {
    Pending,
    Ready(f64),
    Undecodable,
}

struct Player {
    audio: AudioBytes,
    metadata: watch::Receiver<Metadata>,
    events: mpsc::UnboundedSender<PlaybackEvent>,
    clock: Arc<Mutex<Clock>>,
}

fn lock(clock: &Mutex<Clock>) -> MutexGuard<'_, Clock> {
    clock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 时钟驱动的播放引擎
pub struct ClockPlaybackEngine {
    config: ClockEngineConfig,
    players: DashMap<Uuid, Player>,
}

impl ClockPlaybackEngine {
    pub fn new(config: ClockEngineConfig) -> Self {
        tracing::info!(
            autoplay_allowed = config.autoplay_allowed,
            tick_ms = config.tick_ms,
            "ClockPlaybackEngine initialized"
        );
        Self {
            config,
            players: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 当前存活的播放器数量
    pub fn live_players(&self) -> usize {
        self.players.len()
    }

    fn spawn_ticker(
        &self,
        clock: Arc<Mutex<Clock>>,
        mut metadata: watch::Receiver<Metadata>,
        events: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> JoinHandle<()> {
        let tick = Duration::from_millis(self.config.tick_ms);

        tokio::spawn(async move {
            let resolved = metadata
                .wait_for(|m| *m != Metadata::Pending)
                .await
                .map(|m| *m);
            let duration = match resolved {
                Ok(Metadata::Ready(duration)) => duration,
                _ => {
                    let mut clock = lock(&clock);
                    clock.playing = false;
                    clock.ticker = None;
                    return;
                }
            };

            let mut interval = tokio::time::interval(tick);
            interval.tick().await;

            loop {
                interval.tick().await;

                let finished = {
                    let mut clock = lock(&clock);
                    if !clock.playing {
                        break;
                    }
                    clock.position += tick.as_secs_f64() * clock.speed as f64;
                    let event = if clock.position >= duration {
                        clock.position = 0.0;
                        clock.playing = false;
                        clock.ticker = None;
                        PlaybackEvent::Ended
                    } else {
                        PlaybackEvent::TimeUpdate {
                            position: clock.position,
                        }
                    };
                    let ended = event == PlaybackEvent::Ended;
                    events.send(event).is_err() || ended
                };

                if finished {
                    break;
                }
            }
        })
    }
}

/// 在 blocking 线程上解析时长，结果写入 `metadata` 并发出对应事件
async fn load_metadata(
    handle_id: Uuid,
    audio: AudioBytes,
    clock: Arc<Mutex<Clock>>,
    metadata: watch::Sender<Metadata>,
    events: mpsc::UnboundedSender<PlaybackEvent>,
) {
    let parsed = tokio::task::spawn_blocking(move || probe(&audio)).await;

    let (state, event) = match parsed {
        Ok(Ok(info)) => {
            tracing::debug!(handle_id = %handle_id, duration = info.duration_secs, "Audio metadata loaded");
            (
                Metadata::Ready(info.duration_secs),
                PlaybackEvent::MetadataLoaded {
                    duration: info.duration_secs,
                },
            )
        }
        Ok(Err(e)) => {
            tracing::warn!(handle_id = %handle_id, error = %e, "Audio cannot be decoded");
            (
                Metadata::Undecodable,
                PlaybackEvent::Error {
                    message: e.to_string(),
                },
            )
        }
        Err(e) => {
            tracing::error!(handle_id = %handle_id, error = %e, "Metadata task failed");
            (
                Metadata::Undecodable,
                PlaybackEvent::Error {
                    message: e.to_string(),
                },
            )
        }
    };

    // 与 ticker 共用时钟锁，MetadataLoaded 总在第一个 TimeUpdate 之前
    let _clock = lock(&clock);
    let _ = metadata.send(state);
    let _ = events.send(event);
}

#[async_trait]
impl PlaybackEnginePort for ClockPlaybackEngine {
    fn create(&self, audio: AudioBytes, speed: PlaybackSpeed) -> Result<LoadedAudio, EngineError> {
        let id = Uuid::new_v4();
        let (events, receiver) = mpsc::unbounded_channel();
        let (metadata_tx, metadata) = watch::channel(Metadata::Pending);

        let clock = Arc::new(Mutex::new(Clock {
            position: 0.0,
            speed: speed.value(),
            playing: false,
            ticker: None,
        }));
        tokio::spawn(load_metadata(
            id,
            audio.clone(),
            clock.clone(),
            metadata_tx,
            events.clone(),
        ));

        self.players.insert(
            id,
            Player {
                audio,
                metadata,
                events,
                clock,
            },
        );

        tracing::debug!(handle_id = %id, "Player created");

        Ok(LoadedAudio {
            handle: PlayableHandle::new(id, format!("/api/audio/{}", id)),
            events: receiver,
        })
    }

    fn release(&self, handle: PlayableHandle) {
        match self.players.remove(&handle.id()) {
            Some((_, player)) => {
                lock(&player.clock).stop_ticker();
                tracing::debug!(handle_id = %handle.id(), "Player released");
            }
            None => tracing::warn!(handle_id = %handle.id(), "Releasing unknown player"),
        }
    }

    async fn start(&self, handle: &PlayableHandle, cause: StartCause) -> Result<(), EngineError> {
        if cause == StartCause::Autoplay && !self.config.autoplay_allowed {
            return Err(EngineError::AutoplayBlocked);
        }

        let (clock, metadata, events) = {
            let player = self
                .players
                .get(&handle.id())
                .ok_or(EngineError::UnknownHandle(handle.id()))?;
            (player.clock.clone(), player.metadata.clone(), player.events.clone())
        };

        let current = *metadata.borrow();
        if current == Metadata::Undecodable {
            return Err(EngineError::Failed("audio cannot be decoded".to_string()));
        }

        let mut guard = lock(&clock);
        if guard.playing {
            return Ok(());
        }
        if let Metadata::Ready(duration) = current {
            if guard.position >= duration {
                guard.position = 0.0;
            }
        }
        guard.playing = true;
        // 时长仍在解析时 ticker 先等待结果
        guard.ticker = Some(self.spawn_ticker(clock.clone(), metadata, events));
        Ok(())
    }

    fn pause(&self, handle: &PlayableHandle) {
        if let Some(player) = self.players.get(&handle.id()) {
            lock(&player.clock).stop_ticker();
        }
    }

    fn seek(&self, handle: &PlayableHandle, position: f64) {
        if let Some(player) = self.players.get(&handle.id()) {
            let mut clock = lock(&player.clock);
            clock.position = position;
            let _ = player.events.send(PlaybackEvent::Seeked { position });
        }
    }

    fn set_speed(&self, handle: &PlayableHandle, speed: PlaybackSpeed) {
        if let Some(player) = self.players.get(&handle.id()) {
            lock(&player.clock).speed = speed.value();
        }
    }

    fn resolve(&self, handle_id: Uuid) -> Option<AudioBytes> {
        self.players.get(&handle_id).map(|p| p.audio.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::audio::silent_wav;

    fn engine(autoplay_allowed: bool) -> ClockPlaybackEngine {
        ClockPlaybackEngine::new(ClockEngineConfig {
            autoplay_allowed,
            tick_ms: 10,
        })
    }

    fn wav(duration_ms: u64) -> AudioBytes {
        silent_wav(duration_ms, 8000).into()
    }

    #[tokio::test]
    async fn test_create_reports_duration() {
        let engine = engine(true);
        let mut loaded = engine.create(wav(2000), PlaybackSpeed::NORMAL).unwrap();

        match loaded.events.recv().await.unwrap() {
            PlaybackEvent::MetadataLoaded { duration } => assert!((duration - 2.0).abs() < 0.01),
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(loaded.handle.url(), format!("/api/audio/{}", loaded.handle.id()));
        assert!(engine.resolve(loaded.handle.id()).is_some());
    }

    #[tokio::test]
    async fn test_autoplay_policy() {
        let engine = engine(false);
        let loaded = engine.create(wav(1000), PlaybackSpeed::NORMAL).unwrap();

        assert!(matches!(
            engine.start(&loaded.handle, StartCause::Autoplay).await,
            Err(EngineError::AutoplayBlocked)
        ));
        assert!(engine.start(&loaded.handle, StartCause::UserGesture).await.is_ok());
        engine.release(loaded.handle);
    }

    #[tokio::test]
    async fn test_playback_runs_to_end() {
        let engine = engine(true);
        let mut loaded = engine
            .create(wav(200), PlaybackSpeed::new(2.0).unwrap())
            .unwrap();
        engine.start(&loaded.handle, StartCause::Autoplay).await.unwrap();

        let mut saw_progress = false;
        let ended = tokio::time::timeout(Duration::from_secs(2), async {
            while let Some(event) = loaded.events.recv().await {
                match event {
                    PlaybackEvent::TimeUpdate { .. } => saw_progress = true,
                    PlaybackEvent::Ended => return true,
                    _ => {}
                }
            }
            false
        })
        .await
        .unwrap();

        assert!(ended);
        assert!(saw_progress);
    }

    #[tokio::test]
    async fn test_undecodable_audio_reports_error() {
        let engine = engine(true);
        let mut loaded = engine
            .create(Arc::from(&b"not audio"[..]), PlaybackSpeed::NORMAL)
            .unwrap();

        assert!(matches!(
            loaded.events.recv().await.unwrap(),
            PlaybackEvent::Error { .. }
        ));
        assert!(matches!(
            engine.start(&loaded.handle, StartCause::UserGesture).await,
            Err(EngineError::Failed(_))
        ));
    }

    #[tokio::test]
    async fn test_start_before_metadata_waits_for_duration() {
        let engine = engine(true);
        let mut loaded = engine.create(wav(300), PlaybackSpeed::NORMAL).unwrap();
        // create 不等待解析，立即可以开始播放
        engine.start(&loaded.handle, StartCause::UserGesture).await.unwrap();

        let events = tokio::time::timeout(Duration::from_secs(2), async {
            let mut events = Vec::new();
            while let Some(event) = loaded.events.recv().await {
                let ended = event == PlaybackEvent::Ended;
                events.push(event);
                if ended {
                    break;
                }
            }
            events
        })
        .await
        .unwrap();

        assert!(matches!(events[0], PlaybackEvent::MetadataLoaded { .. }));
        assert!(events[1..]
            .iter()
            .all(|e| matches!(e, PlaybackEvent::TimeUpdate { .. } | PlaybackEvent::Ended)));
        assert_eq!(events.last(), Some(&PlaybackEvent::Ended));
    }

    #[tokio::test]
    async fn test_progress_after_seek_starts_from_target() {
        let engine = engine(true);
        let mut loaded = engine.create(wav(5000), PlaybackSpeed::NORMAL).unwrap();
        engine.start(&loaded.handle, StartCause::UserGesture).await.unwrap();

        // 让进度事件先堆积
        tokio::time::sleep(Duration::from_millis(60)).await;
        engine.seek(&loaded.handle, 4.0);
        tokio::time::sleep(Duration::from_millis(60)).await;
        engine.pause(&loaded.handle);

        let mut after_seek = Vec::new();
        let mut seen_seek = false;
        while let Ok(event) = loaded.events.try_recv() {
            match event {
                PlaybackEvent::Seeked { position } => {
                    assert_eq!(position, 4.0);
                    seen_seek = true;
                }
                PlaybackEvent::TimeUpdate { position } if seen_seek => after_seek.push(position),
                _ => {}
            }
        }

        assert!(seen_seek);
        assert!(!after_seek.is_empty());
        assert!(after_seek.iter().all(|p| *p > 4.0 && *p < 5.0), "{:?}", after_seek);
    }

    #[tokio::test]
    async fn test_release_closes_event_stream() {
        let engine = engine(true);
        let mut loaded = engine.create(wav(1000), PlaybackSpeed::NORMAL).unwrap();
        let id = loaded.handle.id();
        engine.start(&loaded.handle, StartCause::UserGesture).await.unwrap();

        engine.release(loaded.handle);
        assert!(engine.resolve(id).is_none());
        assert_eq!(engine.live_players(), 0);

        // 排空已发出的事件后通道关闭
        let drained = tokio::time::timeout(Duration::from_secs(2), async {
            while loaded.events.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok());
    }
}
