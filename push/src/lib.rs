//! Push Activation Library
//!
//! Device activation for push notifications: a persistent state machine
//! that registers the local device with the push service, deregisters it,
//! and resumes where it left off after a restart.

pub mod activation;
pub mod app;
pub mod device;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod storage;

pub use activation::{
    ActivationEvent, ActivationState, ActivationStateMachine, Completion, CustomRegistration,
    RegistererDelegate, TransitionObserver,
};
pub use app::{Push, PushOptions};
pub use errors::{ErrorInfo, PushError, PUSH_ERROR_DOMAIN};
