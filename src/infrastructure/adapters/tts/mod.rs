//! TTS Adapter - 生成网关实现

mod caching_tts_engine;
mod fake_tts_client;
mod http_tts_client;

pub use caching_tts_engine::CachingTtsEngine;
pub use fake_tts_client::{FakeTtsClient, FakeTtsClientConfig};
pub use http_tts_client::*;
