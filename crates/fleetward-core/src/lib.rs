//! Fleetward Core — domain models, repository traits and the device
//! and session lifecycle services shared by every other crate.

pub mod error;
pub mod models;
pub mod repository;
pub mod service;
pub mod sync;

pub use error::{FleetError, FleetResult};
