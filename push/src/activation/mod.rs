//! Push device activation state machine

pub mod delegate;
pub mod dispatch;
pub mod event;
pub mod machine;
pub mod state;
pub mod transition;
pub mod transport;

pub use delegate::{Completion, CustomRegistration, RegistererDelegate};
pub use event::ActivationEvent;
pub use machine::{ActivationStateMachine, TransitionObserver};
pub use state::ActivationState;
pub use transition::{transition, SideEffect, Step};
pub use transport::{DeregistrationAuth, RegistrationTransport};
