//! Sled-based Preference Store Implementation
//!
//! 每次写入后 flush，保证重启后偏好仍在

use sled::{Db, Tree};
use std::path::Path;
use std::sync::Arc;

use crate::application::ports::{PreferenceError, PreferenceKey, PreferenceStorePort};

const TREE_NAME: &str = "preferences";

/// Sled 偏好存储
pub struct SledPreferenceStore {
    db: Db,
    tree: Tree,
}

impl SledPreferenceStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PreferenceError> {
        let db = sled::open(path.as_ref()).map_err(|e| PreferenceError::DatabaseError(e.to_string()))?;
        let tree = db
            .open_tree(TREE_NAME)
            .map_err(|e| PreferenceError::DatabaseError(e.to_string()))?;

        tracing::info!(path = %path.as_ref().display(), entries = tree.len(), "SledPreferenceStore initialized");

        Ok(Self { db, tree })
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn flush(&self) -> Result<(), PreferenceError> {
        self.db
            .flush()
            .map_err(|e| PreferenceError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

impl PreferenceStorePort for SledPreferenceStore {
    fn get(&self, key: PreferenceKey) -> Result<Option<String>, PreferenceError> {
        let Some(value) = self
            .tree
            .get(key.as_str())
            .map_err(|e| PreferenceError::DatabaseError(e.to_string()))?
        else {
            return Ok(None);
        };

        String::from_utf8(value.to_vec())
            .map(Some)
            .map_err(|e| PreferenceError::InvalidValue {
                key: key.as_str(),
                reason: e.to_string(),
            })
    }

    fn set(&self, key: PreferenceKey, value: &str) -> Result<(), PreferenceError> {
        self.tree
            .insert(key.as_str(), value.as_bytes())
            .map_err(|e| PreferenceError::DatabaseError(e.to_string()))?;
        self.tree
            .flush()
            .map_err(|e| PreferenceError::DatabaseError(e.to_string()))?;

        tracing::debug!(key = key.as_str(), "Preference saved");
        Ok(())
    }

    fn remove(&self, key: PreferenceKey) -> Result<(), PreferenceError> {
        self.tree
            .remove(key.as_str())
            .map_err(|e| PreferenceError::DatabaseError(e.to_string()))?;
        self.tree
            .flush()
            .map_err(|e| PreferenceError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}
