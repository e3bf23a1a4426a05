//! Registerer delegate supplied by the host application

use tokio::sync::oneshot;
use tracing::debug;

use crate::device::{DeviceDetails, IdentityTokenDetails};
use crate::errors::ErrorInfo;

/// Callbacks fired on externally visible activation outcomes.
///
/// Callbacks run on the machine's processing context and must not block.
pub trait RegistererDelegate: Send + Sync {
    /// Activation finished, successfully when `error` is `None`
    fn did_activate(&self, error: Option<&ErrorInfo>);

    /// Deactivation finished, successfully when `error` is `None`
    fn did_deactivate(&self, error: Option<&ErrorInfo>);

    /// Updating an existing registration failed
    fn did_fail_to_register(&self, error: Option<&ErrorInfo>);

    /// Optional capability replacing the built-in HTTP registration calls
    fn custom_registration(&self) -> Option<&dyn CustomRegistration> {
        None
    }
}

/// Host-side registration, e.g. relayed through the application's backend.
///
/// When a delegate exposes this capability the SDK issues no HTTP request
/// for (de)registration and waits for the completion instead.
pub trait CustomRegistration: Send + Sync {
    fn custom_register(&self, device: DeviceDetails, completion: Completion<IdentityTokenDetails>);

    fn custom_deregister(&self, device_id: String, completion: Completion<()>);
}

/// One-shot completion handle for a custom (de)registration.
///
/// Consumed by `complete`, so it completes at most once. Dropping it
/// without completing is reported to the machine as a failure.
#[derive(Debug)]
pub struct Completion<T> {
    sender: oneshot::Sender<Result<T, ErrorInfo>>,
}

impl<T> Completion<T> {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<Result<T, ErrorInfo>>) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, receiver)
    }

    /// Report the outcome
    pub fn complete(self, result: Result<T, ErrorInfo>) {
        if self.sender.send(result).is_err() {
            debug!("Custom registration completed after the machine stopped listening");
        }
    }
}
