//! API models

use serde::{Deserialize, Serialize};

/// Push recipient for an APNs-style device token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRecipient {
    pub transport_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_token: Option<String>,
}

/// Push section of a device registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePush {
    pub recipient: PushRecipient,
}

/// `POST /push/deviceRegistrations` request body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRegistrationRequest {
    pub id: String,
    pub platform: String,
    pub form_factor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub device_secret: String,
    pub push: DevicePush,
}

/// Identity token as returned by the server, timestamps in epoch milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentityToken {
    pub token: String,
    pub issued: i64,
    pub expires: i64,
    #[serde(default)]
    pub capability: String,
    #[serde(default)]
    pub device_id: Option<String>,
}

/// `POST /push/deviceRegistrations` response body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRegistrationResponse {
    pub device_identity_token: DeviceIdentityToken,
}

/// Error body returned by the REST API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: i64,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub message: String,
}
