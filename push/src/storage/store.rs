//! Key/value persistence for activation state and device identity

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::errors::PushError;
use crate::filesys::file::File;

/// Durable key/value store consumed by the activation machine.
///
/// Every method either completes durably or returns a `StorageError`.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the value stored under `key`
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, PushError>;

    /// Store `value` under `key`, replacing any previous value
    async fn write(&self, key: &str, value: &[u8]) -> Result<(), PushError>;

    /// Remove `key`; removing a missing key is not an error
    async fn delete(&self, key: &str) -> Result<(), PushError>;
}

/// In-memory store, suitable for tests and ephemeral SDK instances
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, PushError> {
        self.entries
            .lock()
            .map_err(|_| PushError::StorageError("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, PushError> {
        Ok(self.entries()?.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &[u8]) -> Result<(), PushError> {
        self.entries()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), PushError> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// File-backed store: one file per key under a base directory
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &std::path::Path {
        &self.base_dir
    }

    fn file(&self, key: &str) -> File {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        File::new(self.base_dir.join(format!("{}.bin", name)))
    }
}

/// Every filesystem failure is reported as a storage error
fn storage_error(key: &str, err: PushError) -> PushError {
    error!("State store failure on key {}: {}", key, err);
    PushError::StorageError(format!("{}: {}", key, err))
}

#[async_trait]
impl StateStore for FileStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, PushError> {
        self.file(key)
            .read_bytes()
            .await
            .map_err(|e| storage_error(key, e))
    }

    async fn write(&self, key: &str, value: &[u8]) -> Result<(), PushError> {
        let file = self.file(key);
        debug!("Writing {} bytes to {}", value.len(), file.path().display());
        file.write_atomic(value)
            .await
            .map_err(|e| storage_error(key, e))?;
        file.set_permissions_600()
            .await
            .map_err(|e| storage_error(key, e))
    }

    async fn delete(&self, key: &str) -> Result<(), PushError> {
        self.file(key)
            .delete()
            .await
            .map_err(|e| storage_error(key, e))
    }
}
