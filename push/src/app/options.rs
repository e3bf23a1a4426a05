//! Push SDK configuration options

use std::time::Duration;

use tracing::info;

use crate::errors::PushError;
use crate::logs::LogOptions;
use crate::storage::layout::{StorageKeys, StorageLayout};
use crate::storage::settings::{DeviceSettings, RestSettings, Settings};

/// Options for a `Push` instance
#[derive(Debug, Clone)]
pub struct PushOptions {
    /// REST endpoint configuration
    pub rest: RestSettings,

    /// Device description sent on registration
    pub device: DeviceSettings,

    /// Namespace of every persisted key
    pub storage_namespace: String,

    /// On-disk layout used by `Push::open`
    pub layout: StorageLayout,

    /// Logging configuration
    pub log: LogOptions,
}

impl Default for PushOptions {
    fn default() -> Self {
        Self::from_settings(Settings::default(), StorageLayout::default())
    }
}

impl PushOptions {
    /// Build options from a parsed settings file
    pub fn from_settings(settings: Settings, layout: StorageLayout) -> Self {
        let log = LogOptions {
            log_level: settings.log_level,
            log_dir: Some(layout.logs_dir()),
            ..LogOptions::default()
        };

        Self {
            rest: settings.rest,
            device: settings.device,
            storage_namespace: settings.storage_namespace,
            layout,
            log,
        }
    }

    /// Load options from the layout's settings file, falling back to
    /// defaults when there is none
    pub async fn load(layout: StorageLayout) -> Result<Self, PushError> {
        let file = layout.settings_file();
        let settings = if file.exists().await {
            Settings::load(&file).await?
        } else {
            info!(
                "No settings file at {}, using defaults",
                file.path().display()
            );
            Settings::default()
        };
        Ok(Self::from_settings(settings, layout))
    }

    pub fn keys(&self) -> StorageKeys {
        StorageKeys::new(self.storage_namespace.clone())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.rest.timeout_secs)
    }
}
