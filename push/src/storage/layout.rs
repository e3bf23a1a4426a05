//! Storage layout and key naming

use std::path::PathBuf;

use crate::filesys::file::File;

/// On-disk layout for a push SDK instance
#[derive(Debug, Clone)]
pub struct StorageLayout {
    /// Base directory for all storage
    pub base_dir: PathBuf,
}

impl StorageLayout {
    /// Create a new storage layout
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Get the settings file path
    pub fn settings_file(&self) -> File {
        File::new(self.base_dir.join("settings.json"))
    }

    /// Get the directory backing the `FileStore`
    pub fn state_dir(&self) -> PathBuf {
        self.base_dir.join("state")
    }

    /// Get the logs directory
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        let base_dir = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ably-push");

        Self::new(base_dir)
    }
}

/// Store keys, namespaced to one SDK instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    namespace: String,
}

impl StorageKeys {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn key(&self, name: &str) -> String {
        format!("{}.{}", self.namespace, name)
    }

    /// Current activation state
    pub fn current_state(&self) -> String {
        self.key("ActivationCurrentState")
    }

    /// Events accepted but not yet processed
    pub fn pending_events(&self) -> String {
        self.key("ActivationPendingEvents")
    }

    pub fn device_id(&self) -> String {
        self.key("DeviceId")
    }

    pub fn device_secret(&self) -> String {
        self.key("DeviceSecret")
    }

    pub fn push_token(&self) -> String {
        self.key("DeviceToken")
    }

    pub fn identity_token(&self) -> String {
        self.key("DeviceIdentityToken")
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::new("push.default")
    }
}
