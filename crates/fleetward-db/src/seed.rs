//! Seed data loading.
//!
//! Tenants and users are provisioned out of band. A seed file lists them
//! in TOML:
//!
//! ```toml
//! [[tenants]]
//! id = "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx"
//! name = "dev"
//! owner = "username"
//!
//! [[users]]
//! tenant_id = "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx"
//! username = "username"
//! name = "Dev User"
//! email = "user@example.com"
//! password = "password"
//! ```
//!
//! Applying a seed is idempotent: records that already exist are left
//! untouched.

use std::path::Path;

use fleetward_core::error::FleetError;
use fleetward_core::models::tenant::CreateTenant;
use fleetward_core::models::user::CreateUser;
use fleetward_core::repository::{TenantRepository, UserRepository};
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use tracing::{debug, info};

use crate::error::DbError;
use crate::repository::{SurrealTenantRepository, SurrealUserRepository};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedData {
    #[serde(default)]
    pub tenants: Vec<CreateTenant>,
    #[serde(default)]
    pub users: Vec<CreateUser>,
}

/// What a seed run actually changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub tenants_created: usize,
    pub users_created: usize,
}

impl SeedData {
    pub fn from_toml(raw: &str) -> Result<Self, DbError> {
        toml::from_str(raw).map_err(|e| DbError::Seed(e.to_string()))
    }
}

/// Read and parse a seed file.
pub fn load_seed_file(path: impl AsRef<Path>) -> Result<SeedData, DbError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| DbError::Seed(format!("{}: {e}", path.display())))?;
    SeedData::from_toml(&raw)
}

/// Create every tenant and user in `data` that does not exist yet.
pub async fn apply_seed<C: Connection>(
    db: &Surreal<C>,
    data: SeedData,
    pepper: Option<&str>,
) -> Result<SeedReport, DbError> {
    let tenants = SurrealTenantRepository::new(db.clone());
    let users = match pepper {
        Some(p) => SurrealUserRepository::with_pepper(db.clone(), p.to_string()),
        None => SurrealUserRepository::new(db.clone()),
    };

    let mut report = SeedReport::default();

    for tenant in data.tenants {
        let id = tenant.id.clone();
        match tenants.create(tenant).await {
            Ok(_) => {
                info!(tenant_id = %id, "Seeded tenant");
                report.tenants_created += 1;
            }
            Err(FleetError::AlreadyExists { .. }) => {
                debug!(tenant_id = %id, "Tenant already present");
            }
            Err(e) => return Err(DbError::Seed(format!("tenant {id}: {e}"))),
        }
    }

    for user in data.users {
        let username = user.username.clone();
        match users.create(user).await {
            Ok(_) => {
                info!(username = %username, "Seeded user");
                report.users_created += 1;
            }
            Err(FleetError::AlreadyExists { .. }) => {
                debug!(username = %username, "User already present");
            }
            Err(e) => return Err(DbError::Seed(format!("user {username}: {e}"))),
        }
    }

    Ok(report)
}
