//! Domain models for Fleetward.
//!
//! These are the core types shared across all crates.

pub mod device;
pub mod session;
pub mod stats;
pub mod tenant;
pub mod user;
