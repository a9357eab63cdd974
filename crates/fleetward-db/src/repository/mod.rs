//! SurrealDB repository implementations.

mod device;
mod session;
mod tenant;
mod user;

pub use device::SurrealDeviceRepository;
pub use session::SurrealSessionRepository;
pub use tenant::SurrealTenantRepository;
pub use user::{SurrealUserRepository, hash_password};

use surrealdb_types::SurrealValue;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// First `total` of a `GROUP ALL` count result; an empty table yields
/// no row at all.
fn first_total(rows: &[CountRow]) -> u64 {
    rows.first().map(|r| r.total).unwrap_or(0)
}

/// Whether a statement failed on an existing record id or a unique index
/// entry. Any other statement error is a storage fault.
fn is_duplicate(err: &surrealdb::Error) -> bool {
    let message = err.to_string();
    message.contains("already exists") || message.contains("already contains")
}
