//! Device key-value store.
//!
//! Values are stored as individual files inside one directory:
//! ```text
//! base_path/
//! ├── interview-prep-input
//! └── interview-prep-saved
//! ```

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

use crate::atomic::{atomic_write, read_optional};
use crate::error::{PersistenceError, Result};

/// String key-value store backed by a directory on disk.
///
/// Cloning is cheap and every clone addresses the same directory.
#[derive(Debug, Clone)]
pub struct DeviceStore {
    base_path: PathBuf,
}

impl DeviceStore {
    /// Creates a store rooted at `base_path`. The directory is created lazily
    /// on the first write.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\']);
        if !valid {
            return Err(PersistenceError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(key))
    }

    /// Returns the value for `key`, or `None` if it was never set.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        read_optional(&path)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        trace!(key, bytes = value.len(), "Writing device value");
        atomic_write(&path, value.as_bytes())
    }

    /// Reads and deserializes a JSON value.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    /// Serializes `value` as JSON and stores it.
    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.set(key, &json)
    }
}
