//! Registration transport contract

use async_trait::async_trait;
use tracing::warn;

use crate::device::{DeviceDetails, IdentityTokenDetails};
use crate::errors::ErrorInfo;

/// Credential used to authenticate a deregistration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeregistrationAuth {
    /// Locally generated device secret
    DeviceSecret(String),

    /// Base64 form of the server-issued identity token
    DeviceIdentityToken(String),
}

impl DeregistrationAuth {
    /// Pick the credential for a device; the identity token wins when present
    pub fn for_device(secret: &str, identity_token: Option<&IdentityTokenDetails>) -> Self {
        match identity_token {
            Some(details) => {
                if details.is_expired() {
                    warn!(
                        "Identity token of device {} expired at {}, deregistering with it anyway",
                        details.device_id, details.expires
                    );
                }
                DeregistrationAuth::DeviceIdentityToken(details.base64_token())
            }
            None => DeregistrationAuth::DeviceSecret(secret.to_string()),
        }
    }

    /// The single header carrying this credential
    pub fn header(&self) -> (&'static str, String) {
        match self {
            DeregistrationAuth::DeviceSecret(secret) => ("X-Ably-DeviceSecret", secret.clone()),
            DeregistrationAuth::DeviceIdentityToken(token) => {
                ("X-Ably-DeviceIdentityToken", token.clone())
            }
        }
    }
}

/// The two network operations the activation machine needs.
///
/// Each call is a single attempt that completes exactly once; retry policy
/// belongs to the application.
#[async_trait]
pub trait RegistrationTransport: Send + Sync {
    /// Register the device and obtain its identity token
    async fn register(&self, device: &DeviceDetails) -> Result<IdentityTokenDetails, ErrorInfo>;

    /// Remove the registration of `device_id`
    async fn deregister(&self, device_id: &str, auth: &DeregistrationAuth)
        -> Result<(), ErrorInfo>;
}
