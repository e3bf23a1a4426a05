//! SDK entry point

pub mod options;
pub mod push;

pub use options::PushOptions;
pub use push::Push;
