//! Execution of the registration side effects.
//!
//! Each function performs one attempt, preferring the delegate's custom
//! capability over the transport, and turns the outcome into the event fed
//! back to the machine.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::activation::delegate::{Completion, RegistererDelegate};
use crate::activation::event::ActivationEvent;
use crate::activation::transport::{DeregistrationAuth, RegistrationTransport};
use crate::device::DeviceDetails;
use crate::errors::{ErrorInfo, PushError};

/// Register `device`, yielding `GotDeviceRegistration` or
/// `GettingDeviceRegistrationFailed`
pub async fn register(
    device: DeviceDetails,
    delegate: Arc<dyn RegistererDelegate>,
    transport: Arc<dyn RegistrationTransport>,
) -> ActivationEvent {
    let result = match delegate.custom_registration() {
        Some(custom) => {
            debug!("Registering device {} through the delegate", device.id);
            let (completion, receiver) = Completion::channel();
            custom.custom_register(device, completion);
            wait_for_host(receiver).await
        }
        None => {
            debug!("Registering device {} over HTTP", device.id);
            transport.register(&device).await
        }
    };

    match result {
        Ok(details) => ActivationEvent::GotDeviceRegistration(details),
        Err(err) => {
            warn!("Device registration failed: {}", err);
            ActivationEvent::GettingDeviceRegistrationFailed(err)
        }
    }
}

/// Deregister `device_id`, yielding `GotDeregistered` or
/// `GettingDeregistrationFailed`
pub async fn deregister(
    device_id: String,
    auth: DeregistrationAuth,
    delegate: Arc<dyn RegistererDelegate>,
    transport: Arc<dyn RegistrationTransport>,
) -> ActivationEvent {
    let result = match delegate.custom_registration() {
        Some(custom) => {
            debug!("Deregistering device {} through the delegate", device_id);
            let (completion, receiver) = Completion::channel();
            custom.custom_deregister(device_id, completion);
            wait_for_host(receiver).await
        }
        None => {
            debug!("Deregistering device {} over HTTP", device_id);
            transport.deregister(&device_id, &auth).await
        }
    };

    match result {
        Ok(()) => ActivationEvent::GotDeregistered,
        Err(err) => {
            warn!("Device deregistration failed: {}", err);
            ActivationEvent::GettingDeregistrationFailed(err)
        }
    }
}

/// Await a host completion, rewrapping its error into the push domain
async fn wait_for_host<T>(receiver: oneshot::Receiver<Result<T, ErrorInfo>>) -> Result<T, ErrorInfo> {
    match receiver.await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(ErrorInfo::from(PushError::DelegateCallbackError(err))),
        Err(_) => Err(ErrorInfo::from(PushError::DelegateCallbackError(ErrorInfo::new(
            50000,
            "custom registration completion dropped without a result",
        )))),
    }
}
