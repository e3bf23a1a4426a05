//! Activation states

/// Activation state of the local device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ActivationState {
    /// Initial state, no registration and no activation intent
    #[default]
    NotActivated,

    /// Activation requested, waiting for the platform push token
    WaitingForPushDeviceDetails,

    /// Registration request in flight
    WaitingForDeviceRegistration,

    /// Registered; waiting for a new push token or a deactivation
    WaitingForNewPushDeviceDetails,

    /// Registration update in flight. Push-token rotation is not supported
    /// on this platform, so nothing transitions into this state.
    WaitingForRegistrationUpdate,

    /// A registration update failed. Unreachable, like
    /// `WaitingForRegistrationUpdate`.
    AfterRegistrationUpdateFailed,

    /// Deregistration requested
    WaitingForDeregistration,
}

impl ActivationState {
    /// Tag written to the current-state key
    pub fn tag(&self) -> &'static str {
        match self {
            ActivationState::NotActivated => "NotActivated",
            ActivationState::WaitingForPushDeviceDetails => "WaitingForPushDeviceDetails",
            ActivationState::WaitingForDeviceRegistration => "WaitingForDeviceRegistration",
            ActivationState::WaitingForNewPushDeviceDetails => "WaitingForNewPushDeviceDetails",
            ActivationState::WaitingForRegistrationUpdate => "WaitingForRegistrationUpdate",
            ActivationState::AfterRegistrationUpdateFailed => "AfterRegistrationUpdateFailed",
            ActivationState::WaitingForDeregistration => "WaitingForDeregistration",
        }
    }

    /// Parse a persisted tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        let state = match tag {
            "NotActivated" => ActivationState::NotActivated,
            "WaitingForPushDeviceDetails" => ActivationState::WaitingForPushDeviceDetails,
            "WaitingForDeviceRegistration" => ActivationState::WaitingForDeviceRegistration,
            "WaitingForNewPushDeviceDetails" => ActivationState::WaitingForNewPushDeviceDetails,
            "WaitingForRegistrationUpdate" => ActivationState::WaitingForRegistrationUpdate,
            "AfterRegistrationUpdateFailed" => ActivationState::AfterRegistrationUpdateFailed,
            "WaitingForDeregistration" => ActivationState::WaitingForDeregistration,
            _ => return None,
        };
        Some(state)
    }
}

impl std::fmt::Display for ActivationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}
