//! Device identity token management

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use openapi_client::models::DeviceIdentityToken;
use serde::{Deserialize, Serialize};

use crate::errors::PushError;

/// Server-issued proof that a device is registered for push
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityTokenDetails {
    /// Raw token string
    pub token: String,

    /// Issued at
    pub issued: DateTime<Utc>,

    /// Expires at
    pub expires: DateTime<Utc>,

    /// Capability granted to the token
    #[serde(default)]
    pub capability: String,

    /// Device the token was issued for
    pub device_id: String,
}

impl IdentityTokenDetails {
    pub fn new(
        token: impl Into<String>,
        issued: DateTime<Utc>,
        expires: DateTime<Utc>,
        capability: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            issued,
            expires,
            capability: capability.into(),
            device_id: device_id.into(),
        }
    }

    /// Convert the wire representation (epoch milliseconds).
    ///
    /// `fallback_device_id` is used when the server omits the device id.
    pub fn from_wire(
        wire: DeviceIdentityToken,
        fallback_device_id: &str,
    ) -> Result<Self, PushError> {
        let issued = DateTime::from_timestamp_millis(wire.issued).ok_or_else(|| {
            PushError::TransportError {
                status: 200,
                code: 40000,
                message: format!("Invalid identity token issue time: {}", wire.issued),
            }
        })?;
        let expires = DateTime::from_timestamp_millis(wire.expires).ok_or_else(|| {
            PushError::TransportError {
                status: 200,
                code: 40000,
                message: format!("Invalid identity token expiry time: {}", wire.expires),
            }
        })?;

        Ok(Self {
            token: wire.token,
            issued,
            expires,
            capability: wire.capability,
            device_id: wire
                .device_id
                .unwrap_or_else(|| fallback_device_id.to_string()),
        })
    }

    /// Token in the form sent in the `X-Ably-DeviceIdentityToken` header
    pub fn base64_token(&self) -> String {
        STANDARD.encode(self.token.as_bytes())
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        self.expires < Utc::now()
    }
}
