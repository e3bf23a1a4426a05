//! Settings file management

use secrecy::SecretString;
use serde::Deserialize;

use crate::errors::PushError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Push SDK settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// REST endpoint configuration
    #[serde(default)]
    pub rest: RestSettings,

    /// Local device description sent on registration
    #[serde(default)]
    pub device: DeviceSettings,

    /// Namespace for every persisted key of this SDK instance
    #[serde(default = "default_namespace")]
    pub storage_namespace: String,
}

fn default_namespace() -> String {
    "push.default".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            rest: RestSettings::default(),
            device: DeviceSettings::default(),
            storage_namespace: default_namespace(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file
    pub async fn load(file: &File) -> Result<Self, PushError> {
        let contents = file.read_string().await.map_err(|e| {
            PushError::ConfigurationError(format!(
                "Failed to read settings file {}: {}",
                file.path().display(),
                e
            ))
        })?;
        Self::from_json(&contents)
    }

    /// Parse settings from a JSON document
    pub fn from_json(contents: &str) -> Result<Self, PushError> {
        serde_json::from_str(contents)
            .map_err(|e| PushError::ConfigurationError(format!("Invalid settings: {}", e)))
    }
}

/// REST API settings
#[derive(Debug, Clone, Deserialize)]
pub struct RestSettings {
    /// Base URL for the REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (`name:secret`) used for Basic authentication
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://rest.ably.io".to_string()
}

fn default_timeout() -> u64 {
    15
}

impl Default for RestSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout(),
        }
    }
}

/// Device description settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DeviceSettings {
    /// Platform reported on registration (e.g. "ios", "android")
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Form factor reported on registration (e.g. "phone", "tablet")
    #[serde(default = "default_form_factor")]
    pub form_factor: String,

    /// Push transport of the recipient (e.g. "apns", "fcm")
    #[serde(default = "default_transport_type")]
    pub transport_type: String,

    /// Client ID bound to the device
    #[serde(default)]
    pub client_id: Option<String>,
}

fn default_platform() -> String {
    "ios".to_string()
}

fn default_form_factor() -> String {
    "phone".to_string()
}

fn default_transport_type() -> String {
    "apns".to_string()
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            platform: default_platform(),
            form_factor: default_form_factor(),
            transport_type: default_transport_type(),
            client_id: None,
        }
    }
}
