//! Activation events

use serde::{Deserialize, Serialize};

use crate::device::IdentityTokenDetails;
use crate::errors::ErrorInfo;

/// Input to the activation state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ActivationEvent {
    /// The application asked to activate push
    CalledActivate,

    /// The application asked to deactivate push
    CalledDeactivate,

    /// The platform delivered a push token
    GotPushDeviceDetails,

    /// Registration succeeded and an identity token was issued
    GotDeviceRegistration(IdentityTokenDetails),

    /// Registration failed
    GettingDeviceRegistrationFailed(ErrorInfo),

    /// Registration update succeeded
    RegistrationUpdated,

    /// Registration update failed
    UpdatingRegistrationFailed(ErrorInfo),

    /// Deregistration succeeded
    GotDeregistered,

    /// Deregistration failed
    GettingDeregistrationFailed(ErrorInfo),
}

impl ActivationEvent {
    /// Event name for logging
    pub fn name(&self) -> &'static str {
        match self {
            ActivationEvent::CalledActivate => "CalledActivate",
            ActivationEvent::CalledDeactivate => "CalledDeactivate",
            ActivationEvent::GotPushDeviceDetails => "GotPushDeviceDetails",
            ActivationEvent::GotDeviceRegistration(_) => "GotDeviceRegistration",
            ActivationEvent::GettingDeviceRegistrationFailed(_) => {
                "GettingDeviceRegistrationFailed"
            }
            ActivationEvent::RegistrationUpdated => "RegistrationUpdated",
            ActivationEvent::UpdatingRegistrationFailed(_) => "UpdatingRegistrationFailed",
            ActivationEvent::GotDeregistered => "GotDeregistered",
            ActivationEvent::GettingDeregistrationFailed(_) => "GettingDeregistrationFailed",
        }
    }

    /// Error carried by failure events
    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            ActivationEvent::GettingDeviceRegistrationFailed(e)
            | ActivationEvent::UpdatingRegistrationFailed(e)
            | ActivationEvent::GettingDeregistrationFailed(e) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActivationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.error() {
            Some(err) => write!(f, "{}({})", self.name(), err),
            None => f.write_str(self.name()),
        }
    }
}
