//! Local device identity

pub mod identity_token;
pub mod local;

pub use identity_token::IdentityTokenDetails;
pub use local::{DeviceDetails, LocalDevice};
