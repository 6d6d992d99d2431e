//! 控制器测试用的端口替身

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify};
use uuid::Uuid;

use crate::application::ports::{
    generate_cache_key, AudioBytes, AudioCachePort, AudioSaverPort, CacheError, CacheMetadata,
    CacheStats, EngineError, InferRequest, InferResponse, LoadedAudio, PlayableHandle,
    PlaybackEnginePort, PlaybackEvent, SaveError, StartCause, TtsEnginePort, TtsError,
};
use crate::domain::playback::{PlaybackSpeed, TextFingerprint, VoiceName};

/// 记录所有调用的播放引擎
#[derive(Default)]
pub(crate) struct RecordingPlaybackEngine {
    block_autoplay: AtomicBool,
    pub created: Mutex<Vec<(Uuid, f32)>>,
    pub released: Mutex<Vec<Uuid>>,
    pub starts: Mutex<Vec<(Uuid, StartCause)>>,
    pub seeks: Mutex<Vec<(Uuid, f64)>>,
    pub speeds: Mutex<Vec<(Uuid, f32)>>,
    senders: DashMap<Uuid, mpsc::UnboundedSender<PlaybackEvent>>,
    audio: DashMap<Uuid, AudioBytes>,
}

impl RecordingPlaybackEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn blocking_autoplay() -> Arc<Self> {
        let engine = Self::default();
        engine.block_autoplay.store(true, Ordering::SeqCst);
        Arc::new(engine)
    }

    pub fn created_ids(&self) -> Vec<Uuid> {
        self.created.lock().unwrap().iter().map(|(id, _)| *id).collect()
    }

    pub fn released_ids(&self) -> Vec<Uuid> {
        self.released.lock().unwrap().clone()
    }

    pub fn live_handles(&self) -> usize {
        self.senders.len()
    }

    /// 模拟平台播放器发出事件
    pub fn emit(&self, handle_id: Uuid, event: PlaybackEvent) {
        if let Some(tx) = self.senders.get(&handle_id) {
            let _ = tx.send(event);
        }
    }
}

#[async_trait]
impl PlaybackEnginePort for RecordingPlaybackEngine {
    fn create(&self, audio: AudioBytes, speed: PlaybackSpeed) -> Result<LoadedAudio, EngineError> {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.insert(id, tx);
        self.audio.insert(id, audio);
        self.created.lock().unwrap().push((id, speed.value()));
        Ok(LoadedAudio {
            handle: PlayableHandle::new(id, format!("/api/audio/{}", id)),
            events: rx,
        })
    }

    fn release(&self, handle: PlayableHandle) {
        assert!(
            self.senders.remove(&handle.id()).is_some(),
            "handle released twice: {}",
            handle.id()
        );
        self.audio.remove(&handle.id());
        self.released.lock().unwrap().push(handle.id());
    }

    async fn start(&self, handle: &PlayableHandle, cause: StartCause) -> Result<(), EngineError> {
        self.starts.lock().unwrap().push((handle.id(), cause));
        if cause == StartCause::Autoplay && self.block_autoplay.load(Ordering::SeqCst) {
            return Err(EngineError::AutoplayBlocked);
        }
        Ok(())
    }

    fn pause(&self, _handle: &PlayableHandle) {}

    fn seek(&self, handle: &PlayableHandle, position: f64) {
        self.seeks.lock().unwrap().push((handle.id(), position));
        self.emit(handle.id(), PlaybackEvent::Seeked { position });
    }

    fn set_speed(&self, handle: &PlayableHandle, speed: PlaybackSpeed) {
        self.speeds.lock().unwrap().push((handle.id(), speed.value()));
    }

    fn resolve(&self, handle_id: Uuid) -> Option<AudioBytes> {
        self.audio.get(&handle_id).map(|a| a.clone())
    }
}

/// 可控的 TTS 引擎
///
/// `gated` 模式下每个请求等待 `release(text)` 后才返回，用于控制完成顺序
#[derive(Default)]
pub(crate) struct ScriptedTtsEngine {
    gated: bool,
    gates: DashMap<String, Arc<Notify>>,
    failing: Mutex<HashSet<String>>,
    pub calls: AtomicUsize,
}

impl ScriptedTtsEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            gated: true,
            ..Default::default()
        })
    }

    pub fn fail_on(&self, text: &str) {
        self.failing.lock().unwrap().insert(text.to_string());
    }

    pub fn release(&self, text: &str) {
        self.gate(text).notify_one();
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn gate(&self, text: &str) -> Arc<Notify> {
        self.gates.entry(text.to_string()).or_default().clone()
    }

    /// 合成结果：文本字节本身，便于断言
    pub fn audio_for(text: &str) -> Vec<u8> {
        format!("audio:{}", text).into_bytes()
    }
}

#[async_trait]
impl TtsEnginePort for ScriptedTtsEngine {
    async fn infer(&self, request: InferRequest) -> Result<InferResponse, TtsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.gated {
            self.gate(&request.text).notified().await;
        }
        if self.failing.lock().unwrap().contains(&request.text) {
            return Err(TtsError::ServiceError(format!("cannot synthesize '{}'", request.text)));
        }
        Ok(InferResponse::from_audio(Self::audio_for(&request.text)))
    }
}

/// 内存音频缓存
#[derive(Default)]
pub(crate) struct MemoryAudioCache {
    entries: DashMap<String, Vec<u8>>,
    broken: AtomicBool,
    pub lookups: AtomicUsize,
}

impl MemoryAudioCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 之后的所有读取都返回错误
    pub fn break_reads(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    pub fn insert(&self, text: &str, voice: VoiceName, audio: Vec<u8>) {
        let key = generate_cache_key(&TextFingerprint::of(text), voice);
        self.entries.insert(key, audio);
    }
}

#[async_trait]
impl AudioCachePort for MemoryAudioCache {
    async fn put(
        &self,
        fingerprint: &TextFingerprint,
        voice: VoiceName,
        audio_data: Vec<u8>,
        _metadata: CacheMetadata,
    ) -> Result<(), CacheError> {
        self.entries.insert(generate_cache_key(fingerprint, voice), audio_data);
        Ok(())
    }

    async fn get(
        &self,
        fingerprint: &TextFingerprint,
        voice: VoiceName,
    ) -> Result<Option<Vec<u8>>, CacheError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.broken.load(Ordering::SeqCst) {
            return Err(CacheError::DatabaseError("disk on fire".to_string()));
        }
        Ok(self
            .entries
            .get(&generate_cache_key(fingerprint, voice))
            .map(|e| e.clone()))
    }

    async fn exists(&self, fingerprint: &TextFingerprint, voice: VoiceName) -> Result<bool, CacheError> {
        Ok(self.entries.contains_key(&generate_cache_key(fingerprint, voice)))
    }

    async fn remove(&self, fingerprint: &TextFingerprint, voice: VoiceName) -> Result<(), CacheError> {
        self.entries.remove(&generate_cache_key(fingerprint, voice));
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.entries.len(),
            ..Default::default()
        }
    }
}

/// 记录保存请求的下载器
#[derive(Default)]
pub(crate) struct RecordingSaver {
    pub saved: Mutex<Vec<(String, usize)>>,
    pub notify: Notify,
}

impl RecordingSaver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl AudioSaverPort for RecordingSaver {
    async fn save(&self, audio: AudioBytes, filename: &str) -> Result<PathBuf, SaveError> {
        self.saved.lock().unwrap().push((filename.to_string(), audio.len()));
        self.notify.notify_one();
        Ok(PathBuf::from(filename))
    }
}
