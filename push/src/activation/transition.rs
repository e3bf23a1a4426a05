//! Transition table of the activation state machine
//!
//! `transition` is pure: it only decides the next state and the side
//! effects, which the machine then executes in order.

use crate::activation::event::ActivationEvent;
use crate::activation::state::ActivationState;
use crate::device::{IdentityTokenDetails, LocalDevice};
use crate::errors::ErrorInfo;

/// Side effect of a transition, executed by the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// `did_activate` on the delegate
    CallActivated(Option<ErrorInfo>),

    /// `did_deactivate` on the delegate
    CallDeactivated(Option<ErrorInfo>),

    /// `did_fail_to_register` on the delegate
    CallRegistrationFailed(Option<ErrorInfo>),

    /// Register the device (custom delegate capability or HTTP)
    Register,

    /// Deregister the device (custom delegate capability or HTTP)
    Deregister,

    /// Persist the identity token on the local device
    PersistIdentityToken(IdentityTokenDetails),

    /// Remove the identity token from the local device
    ClearIdentityToken,

    /// Process `event` next, ahead of anything already queued
    Enqueue(ActivationEvent),
}

impl SideEffect {
    /// Network effects whose completion comes back as an event
    pub fn is_async(&self) -> bool {
        matches!(self, SideEffect::Register | SideEffect::Deregister)
    }
}

/// What the transition function needs to know about the local device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceView {
    pub registered: bool,
    pub has_push_token: bool,
}

impl From<&LocalDevice> for DeviceView {
    fn from(device: &LocalDevice) -> Self {
        Self {
            registered: device.is_registered(),
            has_push_token: device.push_token().is_some(),
        }
    }
}

/// Outcome of feeding one event to one state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub next: ActivationState,
    pub effects: Vec<SideEffect>,
    /// `false` when the pair is not part of the table
    pub handled: bool,
}

impl Step {
    fn to(next: ActivationState, effects: Vec<SideEffect>) -> Self {
        Self {
            next,
            effects,
            handled: true,
        }
    }

    fn stay(state: ActivationState) -> Self {
        Self::to(state, Vec::new())
    }

    fn ignored(state: ActivationState) -> Self {
        Self {
            next: state,
            effects: Vec::new(),
            handled: false,
        }
    }
}

/// Compute the next state and side effects for `event` in `state`
pub fn transition(state: ActivationState, event: &ActivationEvent, device: DeviceView) -> Step {
    use ActivationEvent as E;
    use ActivationState as S;
    use SideEffect as Fx;

    match (state, event) {
        // From NotActivated
        (S::NotActivated, E::CalledActivate) => {
            if device.registered {
                Step::to(S::WaitingForNewPushDeviceDetails, vec![Fx::CallActivated(None)])
            } else if device.has_push_token {
                Step::to(
                    S::WaitingForPushDeviceDetails,
                    vec![Fx::Enqueue(E::GotPushDeviceDetails)],
                )
            } else {
                Step::to(S::WaitingForPushDeviceDetails, Vec::new())
            }
        }
        // A push token without an activation intent registers nothing
        (S::NotActivated, E::GotPushDeviceDetails) => Step::stay(S::NotActivated),
        (S::NotActivated, E::CalledDeactivate) => {
            Step::to(S::NotActivated, vec![Fx::CallDeactivated(None)])
        }

        // From WaitingForPushDeviceDetails
        (S::WaitingForPushDeviceDetails, E::CalledActivate) => {
            Step::stay(S::WaitingForPushDeviceDetails)
        }
        (S::WaitingForPushDeviceDetails, E::CalledDeactivate) => {
            Step::to(S::NotActivated, vec![Fx::CallDeactivated(None)])
        }
        (S::WaitingForPushDeviceDetails, E::GotPushDeviceDetails) => {
            Step::to(S::WaitingForDeviceRegistration, vec![Fx::Register])
        }

        // From WaitingForDeviceRegistration
        (S::WaitingForDeviceRegistration, E::CalledActivate) => {
            Step::stay(S::WaitingForDeviceRegistration)
        }
        (S::WaitingForDeviceRegistration, E::GotDeviceRegistration(details)) => Step::to(
            S::WaitingForNewPushDeviceDetails,
            vec![
                Fx::PersistIdentityToken(details.clone()),
                Fx::CallActivated(None),
            ],
        ),
        (S::WaitingForDeviceRegistration, E::GettingDeviceRegistrationFailed(err)) => {
            Step::to(S::NotActivated, vec![Fx::CallActivated(Some(err.clone()))])
        }

        // From WaitingForNewPushDeviceDetails
        (S::WaitingForNewPushDeviceDetails, E::CalledActivate) => Step::to(
            S::WaitingForNewPushDeviceDetails,
            vec![Fx::CallActivated(None)],
        ),
        (S::WaitingForNewPushDeviceDetails, E::CalledDeactivate) => {
            Step::to(S::WaitingForDeregistration, vec![Fx::Deregister])
        }

        // From WaitingForRegistrationUpdate
        (S::WaitingForRegistrationUpdate, E::CalledActivate) => Step::to(
            S::WaitingForRegistrationUpdate,
            vec![Fx::CallActivated(None)],
        ),
        (S::WaitingForRegistrationUpdate, E::RegistrationUpdated) => {
            Step::to(S::WaitingForNewPushDeviceDetails, Vec::new())
        }
        (S::WaitingForRegistrationUpdate, E::UpdatingRegistrationFailed(err)) => Step::to(
            S::AfterRegistrationUpdateFailed,
            vec![Fx::CallRegistrationFailed(Some(err.clone()))],
        ),

        // From AfterRegistrationUpdateFailed
        (S::AfterRegistrationUpdateFailed, E::CalledDeactivate) => {
            Step::to(S::WaitingForDeregistration, vec![Fx::Deregister])
        }

        // From WaitingForDeregistration. A deactivate sent while the call
        // is outstanding waits in the queue; once processed, no call is
        // outstanding and the deregistration is issued again.
        (S::WaitingForDeregistration, E::CalledDeactivate) => {
            Step::to(S::WaitingForDeregistration, vec![Fx::Deregister])
        }
        (S::WaitingForDeregistration, E::GotDeregistered) => Step::to(
            S::NotActivated,
            vec![Fx::ClearIdentityToken, Fx::CallDeactivated(None)],
        ),
        (S::WaitingForDeregistration, E::GettingDeregistrationFailed(err)) => Step::to(
            S::WaitingForDeregistration,
            vec![Fx::CallDeactivated(Some(err.clone()))],
        ),

        (state, _) => Step::ignored(state),
    }
}
