//! In-Memory Preference Store Implementation
//!
//! 进程内偏好存储，不跨重启保留

use dashmap::DashMap;
use std::sync::Arc;

use crate::application::ports::{PreferenceError, PreferenceKey, PreferenceStorePort};

/// 内存偏好存储
#[derive(Default)]
pub struct InMemoryPreferenceStore {
    entries: DashMap<PreferenceKey, String>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl PreferenceStorePort for InMemoryPreferenceStore {
    fn get(&self, key: PreferenceKey) -> Result<Option<String>, PreferenceError> {
        Ok(self.entries.get(&key).map(|v| v.clone()))
    }

    fn set(&self, key: PreferenceKey, value: &str) -> Result<(), PreferenceError> {
        self.entries.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: PreferenceKey) -> Result<(), PreferenceError> {
        self.entries.remove(&key);
        Ok(())
    }
}
