//! Sled 存储：音频缓存与偏好设置

mod audio_cache;
mod preference_store;

pub use audio_cache::{SledAudioCache, SledCacheConfig};
pub use preference_store::SledPreferenceStore;
