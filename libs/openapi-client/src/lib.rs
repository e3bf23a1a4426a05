//! Wire models for the push device registration REST endpoints.

pub mod models;
