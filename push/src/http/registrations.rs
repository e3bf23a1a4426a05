//! Device registration API client

use async_trait::async_trait;
use openapi_client::models::{
    DevicePush, DeviceRegistrationRequest, DeviceRegistrationResponse, PushRecipient,
};
use tracing::info;

use crate::activation::transport::{DeregistrationAuth, RegistrationTransport};
use crate::device::{DeviceDetails, IdentityTokenDetails};
use crate::errors::{ErrorInfo, PushError};
use crate::http::client::HttpClient;

const DEVICE_REGISTRATIONS: &str = "/push/deviceRegistrations";

impl From<&DeviceDetails> for DeviceRegistrationRequest {
    fn from(device: &DeviceDetails) -> Self {
        Self {
            id: device.id.clone(),
            platform: device.platform.clone(),
            form_factor: device.form_factor.clone(),
            client_id: device.client_id.clone(),
            device_secret: device.secret.clone(),
            push: DevicePush {
                recipient: PushRecipient {
                    transport_type: device.transport_type.clone(),
                    device_token: device.push_token.clone(),
                },
            },
        }
    }
}

impl HttpClient {
    /// Register a device for push
    pub async fn register_device(
        &self,
        device: &DeviceDetails,
    ) -> Result<IdentityTokenDetails, PushError> {
        let request = DeviceRegistrationRequest::from(device);
        let response: DeviceRegistrationResponse =
            self.post(DEVICE_REGISTRATIONS, &request).await?;

        let details = IdentityTokenDetails::from_wire(response.device_identity_token, &device.id)?;
        info!("Device {} registered, token expires {}", device.id, details.expires);
        Ok(details)
    }

    /// Remove a device registration
    pub async fn deregister_device(
        &self,
        device_id: &str,
        auth: &DeregistrationAuth,
    ) -> Result<(), PushError> {
        self.delete(
            DEVICE_REGISTRATIONS,
            &[("deviceId", device_id)],
            &[auth.header()],
        )
        .await?;
        info!("Device {} deregistered", device_id);
        Ok(())
    }
}

#[async_trait]
impl RegistrationTransport for HttpClient {
    async fn register(&self, device: &DeviceDetails) -> Result<IdentityTokenDetails, ErrorInfo> {
        self.register_device(device).await.map_err(ErrorInfo::from)
    }

    async fn deregister(
        &self,
        device_id: &str,
        auth: &DeregistrationAuth,
    ) -> Result<(), ErrorInfo> {
        self.deregister_device(device_id, auth)
            .await
            .map_err(ErrorInfo::from)
    }
}
