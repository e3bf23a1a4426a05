//! REST client for the push registration endpoints

pub mod client;
pub mod registrations;
