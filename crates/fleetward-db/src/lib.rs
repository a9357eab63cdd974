//! Fleetward Database — SurrealDB connection management, schema
//! migrations, seeding and repository implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Seed data loading ([`seed`])
//! - Repository implementations of the `fleetward-core` traits
//! - Error types ([`DbError`])

mod connection;
mod error;
pub mod repository;
mod schema;
pub mod seed;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use repository::hash_password;
pub use schema::{run_migrations, schema_v1};
