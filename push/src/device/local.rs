//! Local device identity and its persistence

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::device::identity_token::IdentityTokenDetails;
use crate::errors::PushError;
use crate::storage::layout::StorageKeys;
use crate::storage::settings::DeviceSettings;
use crate::storage::store::StateStore;

/// Device description handed to the registration transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDetails {
    pub id: String,
    pub secret: String,
    pub platform: String,
    pub form_factor: String,
    pub client_id: Option<String>,
    pub transport_type: String,
    pub push_token: Option<String>,
}

/// The local device identity.
///
/// Every mutation is written to the store before the in-memory value
/// changes, so a failed write leaves both sides untouched.
pub struct LocalDevice {
    id: String,
    secret: String,
    push_token: Option<String>,
    identity_token_details: Option<IdentityTokenDetails>,
    settings: DeviceSettings,
    store: Arc<dyn StateStore>,
    keys: StorageKeys,
}

impl std::fmt::Debug for LocalDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalDevice")
            .field("id", &self.id)
            .field("push_token", &self.push_token)
            .field("identity_token_details", &self.identity_token_details)
            .field("platform", &self.settings.platform)
            .finish_non_exhaustive()
    }
}

impl LocalDevice {
    /// Load the device from the store, generating and persisting a new
    /// id and secret on first use.
    pub async fn load(
        store: Arc<dyn StateStore>,
        keys: StorageKeys,
        settings: DeviceSettings,
    ) -> Result<Self, PushError> {
        let stored_id = read_string(store.as_ref(), &keys.device_id()).await?;
        let stored_secret = read_string(store.as_ref(), &keys.device_secret()).await?;

        let (id, secret) = match (stored_id, stored_secret) {
            (Some(id), Some(secret)) => (id, secret),
            _ => {
                let id = uuid::Uuid::new_v4().to_string();
                let secret = generate_secret();
                store.write(&keys.device_id(), id.as_bytes()).await?;
                store.write(&keys.device_secret(), secret.as_bytes()).await?;
                info!("Generated new local device identity: {}", id);
                (id, secret)
            }
        };

        let push_token = read_string(store.as_ref(), &keys.push_token()).await?;

        let identity_token_details = match store.read(&keys.identity_token()).await? {
            Some(bytes) => Some(serde_json::from_slice(&bytes).map_err(|e| {
                PushError::StorageError(format!("Corrupt identity token entry: {}", e))
            })?),
            None => None,
        };

        Ok(Self {
            id,
            secret,
            push_token,
            identity_token_details,
            settings,
            store,
            keys,
        })
    }

    /// Get the device ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the device secret
    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn push_token(&self) -> Option<&str> {
        self.push_token.as_deref()
    }

    pub fn identity_token_details(&self) -> Option<&IdentityTokenDetails> {
        self.identity_token_details.as_ref()
    }

    /// A device is registered exactly when it holds an identity token
    pub fn is_registered(&self) -> bool {
        self.identity_token_details.is_some()
    }

    /// Snapshot used for registration calls
    pub fn details(&self) -> DeviceDetails {
        DeviceDetails {
            id: self.id.clone(),
            secret: self.secret.clone(),
            platform: self.settings.platform.clone(),
            form_factor: self.settings.form_factor.clone(),
            client_id: self.settings.client_id.clone(),
            transport_type: self.settings.transport_type.clone(),
            push_token: self.push_token.clone(),
        }
    }

    /// Set and persist the platform push token
    pub async fn set_push_token(&mut self, token: Option<String>) -> Result<(), PushError> {
        let key = self.keys.push_token();
        match &token {
            Some(value) => self.store.write(&key, value.as_bytes()).await?,
            None => self.store.delete(&key).await?,
        }
        debug!("Push token {}", if token.is_some() { "stored" } else { "cleared" });
        self.push_token = token;
        Ok(())
    }

    /// Set and persist the identity token issued on registration
    pub async fn set_identity_token_details(
        &mut self,
        details: IdentityTokenDetails,
    ) -> Result<(), PushError> {
        let bytes = serde_json::to_vec(&details)?;
        self.store.write(&self.keys.identity_token(), &bytes).await?;
        info!("Stored identity token for device {}", details.device_id);
        self.identity_token_details = Some(details);
        Ok(())
    }

    /// Remove the identity token after deregistration
    pub async fn clear_identity_token_details(&mut self) -> Result<(), PushError> {
        self.store.delete(&self.keys.identity_token()).await?;
        info!("Cleared identity token for device {}", self.id);
        self.identity_token_details = None;
        Ok(())
    }
}

async fn read_string(store: &dyn StateStore, key: &str) -> Result<Option<String>, PushError> {
    match store.read(key).await? {
        Some(bytes) => String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| PushError::StorageError(format!("{} is not valid UTF-8: {}", key, e))),
        None => Ok(None),
    }
}

/// Fresh 256-bit device secret, base64 encoded
fn generate_secret() -> String {
    let mut hasher = Sha256::new();
    hasher.update(uuid::Uuid::new_v4().as_bytes());
    hasher.update(uuid::Uuid::new_v4().as_bytes());
    STANDARD.encode(hasher.finalize())
}
